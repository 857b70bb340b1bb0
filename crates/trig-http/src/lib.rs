//! trig-http - HTTP surface of the trigger server.
//!
//! ```text
//! GET|POST /setTrigger       action, transnum, username, stock, amount
//! GET|POST /startTrigger     action, username, stock, price
//! GET|POST /cancelTrigger    action, username, stock
//! GET      /runningTriggers  [format=json]
//! GET      /waitingTriggers  [format=json]
//! GET      /health
//! GET      /metrics
//! ```
//!
//! Parameters are read with axum's `Form` extractor, so they may come from
//! the query string or from an `application/x-www-form-urlencoded` body.

mod config;
mod error;
mod params;
mod server;

pub use config::HttpConfig;
pub use error::{HttpError, HttpResult};
pub use params::{CancelParams, ListParams, SetParams, StartParams};
pub use server::{bind, create_router, serve, AppState};
