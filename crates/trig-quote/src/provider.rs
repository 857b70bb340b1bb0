//! Quote provider trait.
//!
//! Abstracts "current price for a stock" so that:
//! - pollers can be unit tested with scripted prices
//! - the transport (TCP quote server, HTTP) is chosen by configuration

use std::collections::{HashMap, VecDeque};
use std::pin::Pin;
use std::sync::atomic::{AtomicUsize, Ordering};

use parking_lot::Mutex;

use trig_core::Price;

use crate::error::{QuoteError, QuoteResult};

/// Boxed future for dyn-compatible async trait methods.
pub type BoxFuture<'a, T> = Pin<Box<dyn std::future::Future<Output = T> + Send + 'a>>;

/// Source of current market prices.
pub trait QuoteProvider: Send + Sync {
    /// Fetch the current price of `stock`, on behalf of `username`.
    fn quote<'a>(&'a self, stock: &'a str, username: &'a str) -> BoxFuture<'a, QuoteResult<Price>>;
}

/// Scripted quote provider for testing.
///
/// Queued replies for a stock are returned first, in order. After the queue
/// drains, the fixed price (if set) is returned on every call.
#[derive(Debug, Default)]
pub struct MockQuoteProvider {
    queued: Mutex<HashMap<String, VecDeque<QuoteResult<Price>>>>,
    fixed: Mutex<HashMap<String, Price>>,
    calls: AtomicUsize,
}

impl MockQuoteProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return `price` for `stock` once the queue is empty.
    pub fn set_price(&self, stock: &str, price: Price) {
        self.fixed.lock().insert(stock.to_string(), price);
    }

    /// Queue one reply for `stock`.
    pub fn push(&self, stock: &str, reply: QuoteResult<Price>) {
        self.queued
            .lock()
            .entry(stock.to_string())
            .or_default()
            .push_back(reply);
    }

    /// Queue a sequence of successful prices for `stock`.
    pub fn push_prices(&self, stock: &str, prices: impl IntoIterator<Item = Price>) {
        for price in prices {
            self.push(stock, Ok(price));
        }
    }

    /// Total `quote` calls so far.
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn next(&self, stock: &str) -> QuoteResult<Price> {
        if let Some(reply) = self
            .queued
            .lock()
            .get_mut(stock)
            .and_then(|queue| queue.pop_front())
        {
            return reply;
        }
        self.fixed
            .lock()
            .get(stock)
            .copied()
            .ok_or_else(|| QuoteError::Unavailable(stock.to_string()))
    }
}

impl QuoteProvider for MockQuoteProvider {
    fn quote<'a>(
        &'a self,
        stock: &'a str,
        _username: &'a str,
    ) -> BoxFuture<'a, QuoteResult<Price>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let reply = self.next(stock);
        Box::pin(async move { reply })
    }
}
