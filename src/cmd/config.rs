use std::io::{self, Write};

use clap::{Args, Subcommand};

use crate::config::{
    AppConfig, DEFAULT_LLM_API_URL, DEFAULT_LLM_MODEL, StoredConfig, config_file_path,
};
use crate::error::AppResult;

#[derive(Args, Debug, Clone)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Subcommand, Debug, Clone)]
pub enum ConfigCommand {
    /// Run the interactive configuration wizard.
    Init,
    /// Show the effective configuration: stored values, environment
    /// overrides and defaults combined (secrets masked).
    Show,
}

pub fn run(command: ConfigCommand) -> AppResult<()> {
    match command {
        ConfigCommand::Init => run_init(),
        ConfigCommand::Show => run_show(),
    }
}

fn run_init() -> AppResult<()> {
    let mut cfg = StoredConfig::load()?;

    println!("Configuring triage.");
    println!("Press Enter to keep the current value, '-' to clear it.");
    println!("Secrets are stored in the local config file; protect your filesystem accordingly.");
    println!();

    apply_prompt("LLM API key", &mut cfg.llm_api_key, true)?;
    apply_prompt(
        &format!("LLM chat-completions URL (default {DEFAULT_LLM_API_URL})"),
        &mut cfg.llm_api_url,
        false,
    )?;
    apply_prompt(
        &format!("LLM model (default {DEFAULT_LLM_MODEL})"),
        &mut cfg.llm_model,
        false,
    )?;
    apply_prompt("Mail relay URL", &mut cfg.mail_api_url, false)?;
    apply_prompt("Mail relay API key", &mut cfg.mail_api_key, true)?;
    apply_prompt("Sender address", &mut cfg.mail_from, false)?;
    apply_prompt("Data file path", &mut cfg.data_file, false)?;

    cfg.save()?;

    let path = config_file_path()?;
    println!("\nConfiguration saved to {}", path.display());
    Ok(())
}

fn run_show() -> AppResult<()> {
    let path = config_file_path()?;
    let config = AppConfig::load()?;

    println!("Configuration file: {}", path.display());
    for line in effective_lines(&config) {
        println!("{line}");
    }
    for warning in config.warnings() {
        println!("warning: {warning}");
    }

    Ok(())
}

fn effective_lines(config: &AppConfig) -> Vec<String> {
    vec![
        format!("LLM API key: {}", mask_secret(&config.llm.api_key)),
        format!("LLM URL: {}", config.llm.api_url),
        format!("LLM model: {}", config.llm.model),
        format!("Mail relay URL: {}", display_value(&config.mail.api_url)),
        format!("Mail relay API key: {}", mask_secret(&config.mail.api_key)),
        format!("Sender address: {}", config.mail.from),
        format!("Data file: {}", config.data_file.display()),
        format!("Analysis cache: {}", config.cache_file.display()),
    ]
}

fn apply_prompt(field: &str, target: &mut Option<String>, secret: bool) -> AppResult<()> {
    match prompt(field, target.as_deref(), secret)? {
        PromptAction::Keep => {}
        PromptAction::Clear => *target = None,
        PromptAction::Set(value) => *target = Some(value),
    }
    Ok(())
}

fn prompt(field: &str, current: Option<&str>, secret: bool) -> AppResult<PromptAction> {
    let mut stdout = io::stdout();

    match (current, secret) {
        (Some(_), true) => write!(stdout, "{field} [****] (Enter to keep, '-' to clear): ")?,
        (Some(value), false) => {
            write!(stdout, "{field} [{value}] (Enter to keep, '-' to clear): ")?
        }
        (None, _) => write!(stdout, "{field} (Enter to skip): ")?,
    }
    stdout.flush()?;

    let mut input = String::new();
    io::stdin().read_line(&mut input)?;
    Ok(PromptAction::parse(&input))
}

fn display_value(value: &Option<String>) -> String {
    value
        .as_deref()
        .filter(|v| !v.is_empty())
        .map(|v| v.to_string())
        .unwrap_or_else(|| "<not set>".to_string())
}

fn mask_secret(value: &Option<String>) -> String {
    match value {
        Some(token) if token.chars().count() > 6 => {
            let chars = token.chars().collect::<Vec<_>>();
            let prefix = chars[..3].iter().collect::<String>();
            let suffix = chars[chars.len() - 3..].iter().collect::<String>();
            format!("{prefix}***{suffix}")
        }
        Some(token) if !token.is_empty() => "***".to_string(),
        _ => "<not set>".to_string(),
    }
}

#[derive(Debug, PartialEq)]
enum PromptAction {
    Keep,
    Clear,
    Set(String),
}

impl PromptAction {
    fn parse(input: &str) -> Self {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            PromptAction::Keep
        } else if trimmed == "-" {
            PromptAction::Clear
        } else {
            PromptAction::Set(trimmed.to_string())
        }
    }
}
