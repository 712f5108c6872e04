use std::sync::Arc;

use tokio::sync::Mutex;

use crate::cache::AnalysisCache;
use crate::services::{LanguageModelService, NotificationService, TicketStore, UserDirectory};

#[derive(Clone)]
pub struct AppContext {
    pub tickets: Arc<dyn TicketStore>,
    pub users: Arc<dyn UserDirectory>,
    pub language_model: Arc<dyn LanguageModelService>,
    pub notifier: Arc<dyn NotificationService>,
    pub analysis_cache: Option<Arc<Mutex<AnalysisCache>>>,
}

impl AppContext {
    pub fn new(
        tickets: Arc<dyn TicketStore>,
        users: Arc<dyn UserDirectory>,
        language_model: Arc<dyn LanguageModelService>,
        notifier: Arc<dyn NotificationService>,
    ) -> Self {
        Self {
            tickets,
            users,
            language_model,
            notifier,
            analysis_cache: None,
        }
    }

    pub fn with_analysis_cache(mut self, cache: AnalysisCache) -> Self {
        self.analysis_cache = Some(Arc::new(Mutex::new(cache)));
        self
    }
}
