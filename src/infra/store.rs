use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::fs;
use tokio::sync::Mutex;

use crate::domain::assignment::UserQuery;
use crate::domain::ticket::{Ticket, TicketId, TicketUpdate};
use crate::domain::user::User;
use crate::error::{AppError, AppResult};
use crate::services::{TicketStore, UserDirectory};

#[derive(Default, Clone, Serialize, Deserialize)]
struct StoreFile {
    #[serde(default)]
    tickets: Vec<Ticket>,
    #[serde(default)]
    users: Vec<User>,
}

/// Tickets and users kept in a single JSON document.
///
/// Every mutation holds the lock while it rewrites the file, so each
/// read-modify-write is atomic with respect to concurrent triage runs.
/// Changes are made on a copy and only replace the in-memory document once
/// the file write succeeds, so memory never runs ahead of disk.
pub struct JsonFileStore {
    path: PathBuf,
    state: Mutex<StoreFile>,
}

impl JsonFileStore {
    pub async fn open(path: &Path) -> AppResult<Self> {
        let file = match fs::read_to_string(path).await {
            Ok(contents) => serde_json::from_str::<StoreFile>(&contents).map_err(|err| {
                AppError::TicketStore(format!("invalid data file {}: {err}", path.display()))
            })?,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => StoreFile::default(),
            Err(err) => return Err(AppError::Io(err)),
        };

        tracing::debug!(
            path = %path.display(),
            tickets = file.tickets.len(),
            users = file.users.len(),
            "opened data file"
        );

        Ok(Self {
            path: path.to_path_buf(),
            state: Mutex::new(file),
        })
    }

    async fn persist(&self, file: &StoreFile) -> AppResult<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).await?;
        }
        let data = serde_json::to_vec_pretty(file)?;
        let staging = self.path.with_extension("json.tmp");
        fs::write(&staging, data).await?;
        fs::rename(&staging, &self.path).await?;
        Ok(())
    }

    async fn commit(&self, state: &mut StoreFile, staged: StoreFile) -> AppResult<()> {
        self.persist(&staged).await?;
        *state = staged;
        Ok(())
    }
}

#[async_trait]
impl TicketStore for JsonFileStore {
    async fn insert_ticket(&self, ticket: Ticket) -> AppResult<Ticket> {
        let mut state = self.state.lock().await;
        if state.tickets.iter().any(|existing| existing.id == ticket.id) {
            return Err(AppError::TicketStore(format!(
                "ticket {} already exists",
                ticket.id
            )));
        }
        let mut staged = state.clone();
        staged.tickets.push(ticket.clone());
        self.commit(&mut state, staged).await?;
        Ok(ticket)
    }

    async fn find_ticket(&self, id: &TicketId) -> AppResult<Option<Ticket>> {
        let state = self.state.lock().await;
        Ok(state.tickets.iter().find(|ticket| &ticket.id == id).cloned())
    }

    async fn update_ticket(
        &self,
        id: &TicketId,
        update: TicketUpdate,
    ) -> AppResult<Option<Ticket>> {
        let mut state = self.state.lock().await;
        let Some(index) = state.tickets.iter().position(|ticket| &ticket.id == id) else {
            return Ok(None);
        };

        let mut updated = state.tickets[index].clone();
        updated.apply(&update);
        if updated == state.tickets[index] {
            return Ok(Some(updated));
        }

        let mut staged = state.clone();
        staged.tickets[index] = updated.clone();
        self.commit(&mut state, staged).await?;
        Ok(Some(updated))
    }
}

#[async_trait]
impl UserDirectory for JsonFileStore {
    async fn insert_user(&self, user: User) -> AppResult<User> {
        let mut state = self.state.lock().await;
        if state
            .users
            .iter()
            .any(|existing| existing.email.eq_ignore_ascii_case(&user.email))
        {
            return Err(AppError::UserStore(format!(
                "user {} already exists",
                user.email
            )));
        }
        let mut staged = state.clone();
        staged.users.push(user.clone());
        self.commit(&mut state, staged).await?;
        Ok(user)
    }

    async fn list_users(&self) -> AppResult<Vec<User>> {
        Ok(self.state.lock().await.users.clone())
    }

    async fn find_user(&self, query: &UserQuery) -> AppResult<Option<User>> {
        let state = self.state.lock().await;
        Ok(state.users.iter().find(|user| query.matches(user)).cloned())
    }
}
