use clap::Args;

use crate::context::AppContext;
use crate::domain::event::TicketCreated;
use crate::domain::ticket::Ticket;
use crate::domain::user::UserId;
use crate::error::{AppError, AppResult};
use crate::workflow::triage::{TriageOutcome, run_triage};

#[derive(Args, Debug, Clone)]
pub struct CreateTicketArgs {
    /// Short title of the problem.
    #[arg(short, long)]
    pub title: String,
    /// Full description of the problem.
    #[arg(short, long)]
    pub description: String,
    /// Id of the user reporting the ticket.
    #[arg(long)]
    pub created_by: Option<String>,
}

pub struct CreatedTicket {
    pub ticket: Ticket,
    pub triage: TriageOutcome,
}

/// Stores a new ticket and immediately triages it.
pub async fn create(ctx: &AppContext, args: CreateTicketArgs) -> AppResult<CreatedTicket> {
    let title = args.title.trim();
    let description = args.description.trim();
    if title.is_empty() || description.is_empty() {
        return Err(AppError::InvalidInput(
            "title and description are required".to_string(),
        ));
    }

    let ticket = ctx
        .tickets
        .insert_ticket(Ticket::new(
            title.to_string(),
            description.to_string(),
            args.created_by.map(UserId),
        ))
        .await?;
    tracing::info!(ticket_id = %ticket.id, "ticket created");

    let triage = run_triage(ctx, TicketCreated::new(ticket.id.clone())).await;
    Ok(CreatedTicket { ticket, triage })
}
