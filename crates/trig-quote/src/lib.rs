//! Market quote providers.
//!
//! Pollers only see the [`QuoteProvider`] trait. Implementations:
//! - [`QuoteServerClient`]: legacy line-based TCP quote server
//! - [`HttpQuoteClient`]: quote lookup over HTTP
//! - [`MockQuoteProvider`]: scripted prices for tests

pub mod config;
pub mod error;
pub mod http;
pub mod provider;
pub mod tcp;

pub use config::{build_provider, QuoteConfig, QuoteKind};
pub use error::{QuoteError, QuoteResult};
pub use http::HttpQuoteClient;
pub use provider::{BoxFuture, MockQuoteProvider, QuoteProvider};
pub use tcp::{parse_quote_reply, QuoteServerClient};
