use async_trait::async_trait;

use crate::domain::assignment::UserQuery;
use crate::domain::user::User;
use crate::error::AppResult;

#[async_trait]
pub trait UserDirectory: Send + Sync {
    async fn insert_user(&self, user: User) -> AppResult<User>;
    async fn list_users(&self) -> AppResult<Vec<User>>;
    /// First user in storage order satisfying the query.
    async fn find_user(&self, query: &UserQuery) -> AppResult<Option<User>>;
}
