use async_trait::async_trait;
use reqwest::{
    Client,
    header::{AUTHORIZATION, CONTENT_TYPE},
};
use serde::{Deserialize, Serialize};

use crate::config::LlmSettings;
use crate::domain::ticket::Ticket;
use crate::error::{AppError, AppResult};
use crate::services::LanguageModelService;

const SYSTEM_PROMPT: &str = "You are an expert assistant that triages technical support tickets.

For every ticket you:
1. Summarize the issue.
2. Estimate its priority.
3. Write helpful notes and resource links for the human moderator.
4. List the technical skills needed to resolve it.

Respond with a single raw JSON object only. Do not use markdown, code fences, comments or any surrounding text.";

/// OpenAI-compatible chat-completions endpoint (OpenRouter by default).
pub struct ChatCompletionsClient {
    http: Client,
    settings: LlmSettings,
}

impl ChatCompletionsClient {
    pub fn new(settings: LlmSettings) -> Self {
        Self {
            http: Client::new(),
            settings,
        }
    }

    fn api_key(&self) -> AppResult<&str> {
        self.settings
            .api_key
            .as_deref()
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| AppError::Configuration("LLM API key not configured".to_string()))
    }

    fn user_prompt(ticket: &Ticket) -> String {
        format!(
            r#"Analyze the support ticket below and answer with a JSON object containing:

- summary: a 1-2 sentence summary of the issue.
- priority: one of "low", "medium" or "high".
- helpfulNotes: a detailed technical explanation a moderator can use to solve the issue, with useful external links where possible.
- relatedSkills: an array of skills needed to solve the issue (e.g. ["React", "MongoDB"]).

Use exactly this shape:

{{
"summary": "Short summary of the ticket",
"priority": "high",
"helpfulNotes": "Here are useful tips...",
"relatedSkills": ["React", "Node.js"]
}}

---

Ticket information:

- Title: {title}
- Description: {description}"#,
            title = ticket.title,
            description = ticket.description,
        )
    }
}

#[async_trait]
impl LanguageModelService for ChatCompletionsClient {
    async fn analyze_ticket(&self, ticket: &Ticket) -> AppResult<String> {
        let api_key = self.api_key()?;
        let user_prompt = Self::user_prompt(ticket);
        let request_body = ChatCompletionRequest {
            model: &self.settings.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: SYSTEM_PROMPT,
                },
                ChatMessage {
                    role: "user",
                    content: &user_prompt,
                },
            ],
            max_tokens: self.settings.max_tokens,
            temperature: self.settings.temperature,
        };

        let response = self
            .http
            .post(&self.settings.api_url)
            .header(AUTHORIZATION, format!("Bearer {api_key}"))
            .header(CONTENT_TYPE, "application/json")
            .json(&request_body)
            .send()
            .await
            .map_err(|err| AppError::LanguageModel(format!("failed to call model: {err}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unable to read response>".to_string());
            return Err(AppError::LanguageModel(format!(
                "model endpoint responded with {status}: {body}"
            )));
        }

        let payload: ChatCompletionResponse = response.json().await.map_err(|err| {
            AppError::LanguageModel(format!("failed to parse model response: {err}"))
        })?;

        tracing::debug!(model = %self.settings.model, "model replied");

        payload
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| AppError::LanguageModel("model returned no content".to_string()))
    }
}

#[derive(Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatReply,
}

#[derive(Deserialize)]
struct ChatReply {
    content: Option<String>,
}
