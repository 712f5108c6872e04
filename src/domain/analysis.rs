use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::domain::ticket::Priority;

/// Model verdict on a ticket, with every field populated.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TicketAnalysis {
    pub summary: String,
    pub priority: Priority,
    pub helpful_notes: String,
    pub related_skills: Vec<String>,
}

impl TicketAnalysis {
    /// Builds an analysis from an untrusted model payload.
    ///
    /// The payload may be a string holding JSON, an already decoded value, or
    /// absent when the model call failed. Unparseable text, non-object values
    /// and wrongly typed fields all fall back to defaults; this never fails.
    pub fn normalize(raw: Option<&Value>) -> Self {
        let parsed = match raw {
            Some(Value::String(text)) => serde_json::from_str(text).unwrap_or(Value::Null),
            Some(value) => value.clone(),
            None => Value::Null,
        };

        let Value::Object(fields) = parsed else {
            return Self::default();
        };

        Self {
            summary: text_field(&fields, "summary"),
            priority: Priority::resolve(fields.get("priority")),
            helpful_notes: text_field(&fields, "helpfulNotes"),
            related_skills: skill_list(fields.get("relatedSkills")),
        }
    }

    /// Convenience for the raw reply text of a model call.
    pub fn from_response(response: Option<&str>) -> Self {
        let raw = response.map(|text| Value::String(text.to_string()));
        Self::normalize(raw.as_ref())
    }
}

fn text_field(fields: &Map<String, Value>, key: &str) -> String {
    fields
        .get(key)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

fn skill_list(value: Option<&Value>) -> Vec<String> {
    let Some(Value::Array(entries)) = value else {
        return Vec::new();
    };

    let mut skills: Vec<String> = Vec::with_capacity(entries.len());
    for skill in entries.iter().filter_map(skill_name) {
        if !skills.contains(&skill) {
            skills.push(skill);
        }
    }
    skills
}

fn skill_name(entry: &Value) -> Option<String> {
    match entry {
        Value::String(text) => {
            let trimmed = text.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        }
        Value::Number(number) if number.as_f64() != Some(0.0) => Some(number.to_string()),
        _ => None,
    }
}
