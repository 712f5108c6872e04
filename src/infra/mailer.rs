use async_trait::async_trait;
use base64::prelude::{BASE64_STANDARD, Engine as _};
use reqwest::{
    Client,
    header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE},
};
use serde::Serialize;

use crate::config::MailSettings;
use crate::error::{AppError, AppResult};
use crate::services::NotificationService;

/// Sends mail through an HTTP relay that accepts `{from, to, subject, text}`.
pub struct HttpMailer {
    http: Client,
    settings: MailSettings,
}

impl HttpMailer {
    pub fn new(settings: MailSettings) -> Self {
        Self {
            http: Client::new(),
            settings,
        }
    }

    fn endpoint(&self) -> AppResult<&str> {
        self.settings
            .api_url
            .as_deref()
            .ok_or_else(|| AppError::Configuration("mail API URL not configured".to_string()))
    }

    fn auth_header(key: &str) -> String {
        let encoded = BASE64_STANDARD.encode(format!("api:{key}"));
        format!("Basic {encoded}")
    }
}

#[async_trait]
impl NotificationService for HttpMailer {
    async fn send(&self, recipient: &str, subject: &str, body: &str) -> AppResult<()> {
        let recipient = recipient.trim();
        if recipient.is_empty() {
            return Err(AppError::Notification(
                "recipient address must not be empty".to_string(),
            ));
        }

        let endpoint = self.endpoint()?;
        let message = MailMessage {
            from: &self.settings.from,
            to: recipient,
            subject,
            text: body,
        };

        let mut request = self
            .http
            .post(endpoint)
            .header(ACCEPT, "application/json")
            .header(CONTENT_TYPE, "application/json")
            .json(&message);
        if let Some(key) = self.settings.api_key.as_deref() {
            request = request.header(AUTHORIZATION, Self::auth_header(key));
        }

        let response = request
            .send()
            .await
            .map_err(|err| AppError::Notification(format!("failed to call mail relay: {err}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unable to read response>".to_string());
            return Err(AppError::Notification(format!(
                "mail relay responded with {status}: {body}"
            )));
        }

        tracing::info!(to = recipient, subject, "notification sent");
        Ok(())
    }
}

#[derive(Serialize)]
struct MailMessage<'a> {
    from: &'a str,
    to: &'a str,
    subject: &'a str,
    text: &'a str,
}

#[cfg(test)]
mod tests {
    use httpmock::prelude::*;
    use serde_json::json;

    use super::*;

    fn mailer(api_url: Option<String>, api_key: Option<&str>) -> HttpMailer {
        HttpMailer::new(MailSettings {
            api_url,
            api_key: api_key.map(str::to_string),
            from: "triage@example.com".to_string(),
        })
    }

    #[tokio::test]
    async fn posts_message_with_basic_auth() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/send")
                    .header("authorization", "Basic YXBpOmtleS0x")
                    .json_body(json!({
                        "from": "triage@example.com",
                        "to": "mod@example.com",
                        "subject": "Ticket Assigned",
                        "text": "A new ticket is assigned to you: Login broken"
                    }));
                then.status(202);
            })
            .await;

        mailer(Some(server.url("/send")), Some("key-1"))
            .send(
                "mod@example.com",
                "Ticket Assigned",
                "A new ticket is assigned to you: Login broken",
            )
            .await
            .unwrap();

        mock.assert_async().await;
    }

    #[tokio::test]
    async fn reports_relay_failures() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/send");
                then.status(503).body("down");
            })
            .await;

        let err = mailer(Some(server.url("/send")), None)
            .send("mod@example.com", "s", "b")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Notification(message) if message.contains("503")));
    }

    #[tokio::test]
    async fn requires_endpoint_and_recipient() {
        let err = mailer(None, None)
            .send("mod@example.com", "s", "b")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Configuration(_)));

        let err = mailer(Some("http://127.0.0.1:9".to_string()), None)
            .send("  ", "s", "b")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Notification(_)));
    }
}
