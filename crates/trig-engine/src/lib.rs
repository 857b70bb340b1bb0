//! Trigger engine: condition pollers, completion dispatcher, ledger notification.
//!
//! # Architecture
//!
//! ```text
//! activate ──▶ TriggerRegistry (pending → active) ──▶ ConditionPoller (one task per trigger)
//!                      ▲                                     │ fire rule true
//!                      │ complete(key, id)                   ▼
//!              CompletionDispatcher ◀──── mpsc (FIFO) ── FiredTrigger
//!                      │
//!                      ▼
//!               LedgerNotifier (TCP line per fire)
//! ```
//!
//! # Key Components
//!
//! - [`TriggerEngine`]: register/activate/cancel façade that spawns pollers
//! - [`ConditionPoller`]: samples quotes for one active trigger until it fires or is stopped
//! - [`CompletionDispatcher`]: single consumer of fired triggers, notifies the ledger in order
//! - [`LedgerNotifier`]: transport seam for fire notifications

pub mod config;
pub mod dispatcher;
pub mod engine;
pub mod error;
pub mod ledger;
pub mod poller;

pub use config::{EngineConfig, LedgerConfig};
pub use dispatcher::{CompletionDispatcher, DispatchOutcome, DispatchStats};
pub use engine::TriggerEngine;
pub use error::{EngineError, EngineResult, LedgerError, LedgerResult};
pub use ledger::{LedgerNotifier, RecordingLedgerNotifier, TcpLedgerNotifier};
pub use poller::{ConditionPoller, PollOutcome};
