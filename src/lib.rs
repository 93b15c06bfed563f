//! DataClash Library
//!
//! Clan, challenge and war management. Re-exports modules for the server
//! binary, integration testing and embedding.

pub mod aggregate;
pub mod api;
pub mod config;
pub mod db;
pub mod domain;
pub mod error;
pub mod events;
pub mod gate;
pub mod handlers;
pub mod identity;
pub mod queries;
pub mod store;

pub use config::Config;
pub use domain::{CallerContext, DomainError, DomainEvent};
pub use error::{AppError, AppResult};
