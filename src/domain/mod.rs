pub mod analysis;
pub mod assignment;
pub mod event;
pub mod ticket;
pub mod user;
