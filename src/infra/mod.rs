pub mod llm;
pub mod mailer;
pub mod store;
