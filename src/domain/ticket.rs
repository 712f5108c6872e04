use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::domain::analysis::TicketAnalysis;
use crate::domain::user::UserId;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TicketId(pub String);

impl TicketId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TicketId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Lifecycle position of a ticket. Ordered so that status only moves forward.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TicketStatus {
    #[default]
    Todo,
    InProgress,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Low => "low",
            Priority::Medium => "medium",
            Priority::High => "high",
        }
    }

    pub fn from_str(value: &str) -> Option<Self> {
        match value.to_lowercase().as_str() {
            "low" => Some(Priority::Low),
            "medium" => Some(Priority::Medium),
            "high" => Some(Priority::High),
            _ => None,
        }
    }

    /// Coerces an untrusted priority value. Anything that is not one of the
    /// three levels, null and absent included, resolves to `Medium`.
    pub fn resolve(raw: Option<&Value>) -> Self {
        let text = match raw {
            None | Some(Value::Null) => return Priority::default(),
            Some(Value::String(text)) => text.clone(),
            Some(other) => other.to_string(),
        };
        Self::from_str(&text).unwrap_or_default()
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Ticket {
    pub id: TicketId,
    pub title: String,
    pub description: String,
    #[serde(default)]
    pub status: TicketStatus,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub helpful_notes: Option<String>,
    #[serde(default)]
    pub related_skills: Vec<String>,
    #[serde(default)]
    pub assigned_to: Option<UserId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_by: Option<UserId>,
    pub created_at: DateTime<Utc>,
}

impl Ticket {
    pub fn new(title: String, description: String, created_by: Option<UserId>) -> Self {
        Self {
            id: TicketId::generate(),
            title,
            description,
            status: TicketStatus::Todo,
            priority: Priority::Medium,
            helpful_notes: None,
            related_skills: Vec::new(),
            assigned_to: None,
            created_by,
            created_at: Utc::now(),
        }
    }

    /// Applies a partial update in place. Status never moves backwards.
    pub fn apply(&mut self, update: &TicketUpdate) {
        if let Some(status) = update.status {
            self.status = self.status.max(status);
        }
        if let Some(priority) = update.priority {
            self.priority = priority;
        }
        if let Some(notes) = &update.helpful_notes {
            self.helpful_notes = Some(notes.clone());
        }
        if let Some(skills) = &update.related_skills {
            self.related_skills = skills.clone();
        }
        if let Some(assignee) = &update.assigned_to {
            self.assigned_to = assignee.clone();
        }
    }
}

/// Field-scoped change to a stored ticket. `None` leaves a field untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TicketUpdate {
    pub status: Option<TicketStatus>,
    pub priority: Option<Priority>,
    pub helpful_notes: Option<String>,
    pub related_skills: Option<Vec<String>>,
    pub assigned_to: Option<Option<UserId>>,
}

impl TicketUpdate {
    pub fn initialize() -> Self {
        Self {
            status: Some(TicketStatus::Todo),
            ..Self::default()
        }
    }

    pub fn from_analysis(analysis: &TicketAnalysis) -> Self {
        Self {
            status: Some(TicketStatus::InProgress),
            priority: Some(analysis.priority),
            helpful_notes: Some(analysis.helpful_notes.clone()),
            related_skills: Some(analysis.related_skills.clone()),
            assigned_to: None,
        }
    }

    pub fn assign(assignee: Option<UserId>) -> Self {
        Self {
            assigned_to: Some(assignee),
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn ticket() -> Ticket {
        Ticket::new(
            "Login broken".to_string(),
            "Users cannot sign in since the last deploy.".to_string(),
            None,
        )
    }

    #[test]
    fn resolves_priority_values() {
        let cases = [
            (Some(json!("LOW")), Priority::Low),
            (Some(json!("High")), Priority::High),
            (Some(json!("medium")), Priority::Medium),
            (Some(json!("bogus")), Priority::Medium),
            (Some(Value::Null), Priority::Medium),
            (None, Priority::Medium),
        ];
        for (raw, expected) in cases {
            assert_eq!(Priority::resolve(raw.as_ref()), expected, "raw = {raw:?}");
        }
    }

    #[test]
    fn resolves_non_string_priority_to_medium() {
        assert_eq!(Priority::resolve(Some(&json!(3))), Priority::Medium);
        assert_eq!(Priority::resolve(Some(&json!(["high"]))), Priority::Medium);
        assert_eq!(Priority::resolve(Some(&json!(" high "))), Priority::Medium);
    }

    #[test]
    fn status_never_regresses() {
        let mut ticket = ticket();
        ticket.apply(&TicketUpdate {
            status: Some(TicketStatus::InProgress),
            ..TicketUpdate::default()
        });
        ticket.apply(&TicketUpdate::initialize());
        assert_eq!(ticket.status, TicketStatus::InProgress);
    }

    #[test]
    fn analysis_update_is_idempotent() {
        let analysis = TicketAnalysis {
            summary: "Sign-in fails".to_string(),
            priority: Priority::High,
            helpful_notes: "Check the session cookie domain.".to_string(),
            related_skills: vec!["React".to_string(), "Node.js".to_string()],
        };
        let update = TicketUpdate::from_analysis(&analysis);

        let mut once = ticket();
        once.apply(&TicketUpdate::initialize());
        once.apply(&update);

        let mut twice = once.clone();
        twice.apply(&TicketUpdate::initialize());
        twice.apply(&update);

        assert_eq!(once, twice);
        assert_eq!(twice.related_skills, vec!["React", "Node.js"]);
        assert_eq!(twice.status, TicketStatus::InProgress);
        assert_eq!(twice.priority, Priority::High);
    }

    #[test]
    fn assign_update_can_clear_assignee() {
        let mut ticket = ticket();
        ticket.apply(&TicketUpdate::assign(Some(UserId("u-1".to_string()))));
        assert_eq!(ticket.assigned_to, Some(UserId("u-1".to_string())));
        ticket.apply(&TicketUpdate::assign(None));
        assert_eq!(ticket.assigned_to, None);
    }

    #[test]
    fn serializes_with_wire_names() {
        let mut ticket = ticket();
        ticket.apply(&TicketUpdate {
            status: Some(TicketStatus::InProgress),
            priority: Some(Priority::High),
            ..TicketUpdate::default()
        });
        let value = serde_json::to_value(&ticket).unwrap();
        assert_eq!(value["status"], "IN_PROGRESS");
        assert_eq!(value["priority"], "high");
        assert!(value.get("relatedSkills").is_some());
        assert!(value["assignedTo"].is_null());
    }
}
