pub mod config;
pub mod ticket;
pub mod triage;
pub mod user;
