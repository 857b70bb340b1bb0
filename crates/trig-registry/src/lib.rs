//! Trigger registry: the pending and active books.
//!
//! Both books live behind a single lock, so there is no acquisition order
//! to get wrong and a key can never be observed in both books at once.
//! Each active trigger carries a `CancellationToken` that its poller
//! watches; the token is cancelled while the lock is held, before the key
//! leaves the active book.

pub mod error;
pub mod registry;

pub use error::{RegistryError, RegistryResult};
pub use registry::{Activation, Book, Registration, TriggerRegistry};
