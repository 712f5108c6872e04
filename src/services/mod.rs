pub mod language_model;
pub mod notifier;
pub mod ticket_store;
pub mod user_directory;

pub use language_model::LanguageModelService;
pub use notifier::NotificationService;
pub use ticket_store::TicketStore;
pub use user_directory::UserDirectory;
