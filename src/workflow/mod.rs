pub mod step;
pub mod triage;
