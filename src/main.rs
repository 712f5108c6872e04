mod cache;
mod cmd;
mod config;
mod context;
mod domain;
mod error;
mod infra;
mod logging;
mod services;
#[cfg(test)]
mod testing;
mod workflow;

use std::sync::Arc;

use clap::{Args, Parser, Subcommand};
use tokio::io::BufReader;

use crate::cache::AnalysisCache;
use crate::cmd::config::{self as config_cmd, ConfigArgs};
use crate::cmd::ticket::{self as ticket_cmd, CreateTicketArgs};
use crate::cmd::triage as triage_cmd;
use crate::cmd::user::{self as user_cmd, UserArgs};
use crate::config::AppConfig;
use crate::context::AppContext;
use crate::domain::ticket::TicketId;
use crate::error::{AppError, AppResult};
use crate::infra::llm::ChatCompletionsClient;
use crate::infra::mailer::HttpMailer;
use crate::infra::store::JsonFileStore;
use crate::services::TicketStore;

#[derive(Parser)]
#[command(name = "triage", author, version, about = "AI-assisted support ticket triage")]
struct Cli {
    /// Log at debug level.
    #[arg(short, long, global = true)]
    verbose: bool,
    /// Emit logs as JSON lines.
    #[arg(long, global = true)]
    json_logs: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Triage one ticket, as if its ticket-created event had just arrived.
    Process {
        ticket_id: String,
    },
    /// Triage tickets from newline-delimited `{"ticketId": ...}` events on stdin.
    Consume,
    /// Create and inspect tickets.
    Ticket(TicketArgs),
    /// Manage users who can be assigned tickets.
    User(UserArgs),
    /// Manage configuration.
    Config(ConfigArgs),
}

#[derive(Args)]
struct TicketArgs {
    #[command(subcommand)]
    command: TicketCommand,
}

#[derive(Subcommand)]
enum TicketCommand {
    /// Store a new ticket and triage it right away.
    Create(CreateTicketArgs),
    /// Print a stored ticket as JSON.
    Show { ticket_id: String },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    logging::init_logger(cli.verbose, cli.json_logs);

    match run(cli).await {
        Ok(true) => {}
        // Every triage run was reported already; signal the failures.
        Ok(false) => std::process::exit(2),
        Err(error) => {
            tracing::error!(%error, "command failed");
            eprintln!("Error: {error}");
            std::process::exit(1);
        }
    }
}

/// Returns whether every triage run the command started succeeded.
async fn run(cli: Cli) -> AppResult<bool> {
    match cli.command {
        Commands::Config(args) => {
            config_cmd::run(args.command)?;
            Ok(true)
        }
        Commands::User(args) => {
            let config = AppConfig::load()?;
            let store = open_store(&config).await?;
            user_cmd::run(store.as_ref(), args.command).await?;
            Ok(true)
        }
        Commands::Ticket(TicketArgs {
            command: TicketCommand::Show { ticket_id },
        }) => {
            let config = AppConfig::load()?;
            let store = open_store(&config).await?;
            let id = TicketId(ticket_id);
            let ticket = store
                .find_ticket(&id)
                .await?
                .ok_or_else(|| AppError::TicketNotFound(id.to_string()))?;
            println!("{}", serde_json::to_string_pretty(&ticket)?);
            Ok(true)
        }
        Commands::Ticket(TicketArgs {
            command: TicketCommand::Create(args),
        }) => {
            let context = build_context().await?;
            let created = ticket_cmd::create(&context, args).await?;
            println!("Ticket {} created.", created.ticket.id);
            triage_cmd::report(&created.triage);
            Ok(created.triage.success())
        }
        Commands::Process { ticket_id } => {
            let context = build_context().await?;
            let outcome = triage_cmd::process(&context, ticket_id).await;
            triage_cmd::report(&outcome);
            Ok(outcome.success())
        }
        Commands::Consume => {
            let context = build_context().await?;
            let summary =
                triage_cmd::consume(&context, BufReader::new(tokio::io::stdin())).await?;
            println!(
                "Processed {} event(s): {} succeeded, {} failed, {} skipped.",
                summary.succeeded + summary.failed + summary.skipped,
                summary.succeeded,
                summary.failed,
                summary.skipped
            );
            Ok(summary.failed == 0)
        }
    }
}

async fn open_store(config: &AppConfig) -> AppResult<Arc<JsonFileStore>> {
    Ok(Arc::new(JsonFileStore::open(&config.data_file).await?))
}

async fn build_context() -> AppResult<AppContext> {
    let config = AppConfig::load()?;
    for warning in config.warnings() {
        tracing::warn!("{warning}");
    }

    let store = open_store(&config).await?;
    let language_model = Arc::new(ChatCompletionsClient::new(config.llm.clone()));
    let notifier = Arc::new(HttpMailer::new(config.mail.clone()));
    let cache = AnalysisCache::load(&config.cache_file).await?;

    Ok(AppContext::new(store.clone(), store, language_model, notifier).with_analysis_cache(cache))
}
