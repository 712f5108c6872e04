use async_trait::async_trait;

use crate::domain::ticket::{Ticket, TicketId, TicketUpdate};
use crate::error::AppResult;

#[async_trait]
pub trait TicketStore: Send + Sync {
    async fn insert_ticket(&self, ticket: Ticket) -> AppResult<Ticket>;
    async fn find_ticket(&self, id: &TicketId) -> AppResult<Option<Ticket>>;
    /// Applies a partial update atomically and returns the stored result, or
    /// `None` when the ticket does not exist.
    async fn update_ticket(&self, id: &TicketId, update: TicketUpdate)
    -> AppResult<Option<Ticket>>;
}
