//! Integration tests for trig-server.
//!
//! These tests run the whole application on loopback sockets:
//! - HTTP requests through the real router
//! - Condition polling against scripted quotes
//! - Ledger notifications over real TCP connections

pub mod common;
