use async_trait::async_trait;

use crate::domain::ticket::Ticket;
use crate::error::AppResult;

#[async_trait]
pub trait LanguageModelService: Send + Sync {
    /// Asks the model to triage a ticket. Returns the raw reply text, which is
    /// expected but not guaranteed to hold a JSON object.
    async fn analyze_ticket(&self, ticket: &Ticket) -> AppResult<String>;
}
