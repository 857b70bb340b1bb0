//! Trigger server.
//!
//! Wires the trigger engine together:
//! - HTTP endpoints for register/activate/cancel/inspect
//! - Quote provider for condition polling
//! - Completion dispatcher notifying the transaction ledger
//! - Graceful shutdown on ctrl-c / SIGTERM

pub mod app;
pub mod config;
pub mod error;

pub use app::Application;
pub use config::AppConfig;
pub use error::{AppError, AppResult};
