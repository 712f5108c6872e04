use async_trait::async_trait;

use crate::error::AppResult;

#[async_trait]
pub trait NotificationService: Send + Sync {
    async fn send(&self, recipient: &str, subject: &str, body: &str) -> AppResult<()>;
}
