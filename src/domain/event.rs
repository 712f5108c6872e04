use serde::{Deserialize, Serialize};

use crate::domain::ticket::TicketId;

/// Delivered once per newly created ticket; the only way a triage run starts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TicketCreated {
    pub ticket_id: TicketId,
}

impl TicketCreated {
    pub fn new(ticket_id: TicketId) -> Self {
        Self { ticket_id }
    }

    pub fn from_json_line(line: &str) -> serde_json::Result<Self> {
        serde_json::from_str(line.trim())
    }
}
