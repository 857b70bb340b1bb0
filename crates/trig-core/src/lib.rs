//! Core domain types for the trigger server.
//!
//! This crate provides the value types shared by every other crate:
//! - `Action`: BUY or SELL, with the fire rule for each
//! - `TriggerKey`: `(action, stock, username)` identity of a conditional order
//! - `Trigger`: one conditional order and its lifecycle state
//! - `Price`: exact decimal price (no binary floating point)
//! - `FiredTrigger`: a trigger handed from a poller to the completion dispatcher

pub mod decimal;
pub mod error;
pub mod trigger;

pub use decimal::Price;
pub use error::{CoreError, Result};
pub use trigger::{Action, FiredTrigger, Trigger, TriggerId, TriggerKey, TriggerState};
