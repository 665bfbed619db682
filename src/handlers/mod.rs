pub mod admin;
pub mod caller;
pub mod fallback;
pub mod fraud;
pub mod health;
pub mod login;
pub mod metrics;
pub mod register;
pub mod user;
