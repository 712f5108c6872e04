//! Fakes and fixtures shared by unit tests.

use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use tempfile::TempDir;

use crate::context::AppContext;
use crate::domain::event::TicketCreated;
use crate::domain::ticket::{Ticket, TicketId};
use crate::domain::user::{Role, User};
use crate::error::{AppError, AppResult};
use crate::infra::store::JsonFileStore;
use crate::services::{LanguageModelService, NotificationService, TicketStore, UserDirectory};
use crate::workflow::triage::{TriageOutcome, run_triage};

/// Answers every analysis with the same reply, or fails when there is none.
pub struct ScriptedModel {
    pub reply: Option<String>,
    pub calls: AtomicUsize,
}

#[async_trait]
impl LanguageModelService for ScriptedModel {
    async fn analyze_ticket(&self, _ticket: &Ticket) -> AppResult<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.reply
            .clone()
            .ok_or_else(|| AppError::LanguageModel("connection refused".to_string()))
    }
}

#[derive(Default)]
pub struct RecordingNotifier {
    pub fail: bool,
    pub sent: Mutex<Vec<(String, String, String)>>,
}

#[async_trait]
impl NotificationService for RecordingNotifier {
    async fn send(&self, recipient: &str, subject: &str, body: &str) -> AppResult<()> {
        if self.fail {
            return Err(AppError::Notification("relay down".to_string()));
        }
        self.sent.lock().unwrap().push((
            recipient.to_string(),
            subject.to_string(),
            body.to_string(),
        ));
        Ok(())
    }
}

pub struct Harness {
    _dir: TempDir,
    pub store: Arc<JsonFileStore>,
    pub model: Arc<ScriptedModel>,
    pub notifier: Arc<RecordingNotifier>,
    pub ctx: AppContext,
}

impl Harness {
    pub async fn new(reply: Option<&str>) -> Self {
        Self::with_notifier(reply, RecordingNotifier::default()).await
    }

    pub async fn with_notifier(reply: Option<&str>, notifier: RecordingNotifier) -> Self {
        let dir = TempDir::new().unwrap();
        let store = Arc::new(
            JsonFileStore::open(&dir.path().join("data.json"))
                .await
                .unwrap(),
        );
        let model = Arc::new(ScriptedModel {
            reply: reply.map(str::to_string),
            calls: AtomicUsize::new(0),
        });
        let notifier = Arc::new(notifier);
        let ctx = AppContext::new(store.clone(), store.clone(), model.clone(), notifier.clone());
        Self {
            _dir: dir,
            store,
            model,
            notifier,
            ctx,
        }
    }

    pub fn model_calls(&self) -> usize {
        self.model.calls.load(Ordering::SeqCst)
    }

    pub async fn user(&self, email: &str, role: Role, skills: &[&str]) -> User {
        let skills = skills.iter().map(|skill| skill.to_string()).collect();
        self.store
            .insert_user(User::new(email.to_string(), role, skills))
            .await
            .unwrap()
    }

    pub async fn ticket(&self) -> Ticket {
        self.store
            .insert_ticket(Ticket::new(
                "Login broken".to_string(),
                "Users get a 500 after submitting the login form.".to_string(),
                None,
            ))
            .await
            .unwrap()
    }

    pub async fn stored(&self, id: &TicketId) -> Ticket {
        self.store.find_ticket(id).await.unwrap().unwrap()
    }

    pub async fn run(&self, id: &TicketId) -> TriageOutcome {
        run_triage(&self.ctx, TicketCreated::new(id.clone())).await
    }
}
