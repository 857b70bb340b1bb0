//! Trigger identity, lifecycle state, and the fire rule.
//!
//! A trigger is a conditional order: "buy/sell `share_amount` shares of
//! `stock` for `username` once the market price crosses `threshold`".
//!
//! Lifecycle:
//!
//! ```text
//! PENDING ──activate(price)──▶ ACTIVE ──fire──▶ COMPLETED
//!    │                           │
//!    └──────────cancel───────────┴──────────▶ CANCELLED
//! ```

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::decimal::Price;
use crate::error::CoreError;

/// Trigger action: buy or sell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Action {
    Buy,
    Sell,
}

impl Action {
    /// Wire spelling, as used in form parameters and ledger lines.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Buy => "BUY",
            Self::Sell => "SELL",
        }
    }

    /// Fire rule.
    ///
    /// - BUY fires when `observed <= threshold` (cheap enough)
    /// - SELL fires when `observed >= threshold` (expensive enough)
    #[inline]
    pub fn fires_at(&self, observed: Price, threshold: Price) -> bool {
        match self {
            Self::Buy => observed <= threshold,
            Self::Sell => observed >= threshold,
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Action {
    type Err = CoreError;

    /// Exact match only: `"buy"` is rejected just like any other string.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "BUY" => Ok(Self::Buy),
            "SELL" => Ok(Self::Sell),
            other => Err(CoreError::InvalidAction(other.to_string())),
        }
    }
}

/// Composite identity of a trigger: `(action, stock, username)`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TriggerKey {
    pub action: Action,
    pub stock: String,
    pub username: String,
}

impl TriggerKey {
    pub fn new(action: Action, stock: impl Into<String>, username: impl Into<String>) -> Self {
        Self {
            action,
            stock: stock.into(),
            username: username.into(),
        }
    }
}

impl fmt::Display for TriggerKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.action, self.stock, self.username)
    }
}

/// Registry-assigned identity of one registration.
///
/// Keys are reused when a user re-registers; ids are not. The id lets the
/// completion path tell a stale fire event apart from the trigger that
/// currently owns the key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TriggerId(pub u64);

impl fmt::Display for TriggerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TriggerState {
    Pending,
    Active,
    Completed,
    Cancelled,
}

impl TriggerState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Active => "ACTIVE",
            Self::Completed => "COMPLETED",
            Self::Cancelled => "CANCELLED",
        }
    }

    #[inline]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled)
    }
}

impl fmt::Display for TriggerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One conditional order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Trigger {
    pub id: TriggerId,
    pub key: TriggerKey,
    /// Originating command's transaction number, for audit correlation.
    pub transaction_number: i64,
    /// Shares authorized by the order. Fixed at registration.
    pub share_amount: u64,
    /// Absent until activation.
    pub threshold: Option<Price>,
    pub state: TriggerState,
    pub created_at: DateTime<Utc>,
    pub activated_at: Option<DateTime<Utc>>,
}

impl Trigger {
    /// Create a PENDING trigger with no threshold.
    pub fn new_pending(
        id: TriggerId,
        key: TriggerKey,
        transaction_number: i64,
        share_amount: u64,
    ) -> Self {
        Self {
            id,
            key,
            transaction_number,
            share_amount,
            threshold: None,
            state: TriggerState::Pending,
            created_at: Utc::now(),
            activated_at: None,
        }
    }

    #[inline]
    pub fn action(&self) -> Action {
        self.key.action
    }

    /// PENDING -> ACTIVE with the given threshold.
    pub fn activate(&mut self, threshold: Price) {
        self.threshold = Some(threshold);
        self.state = TriggerState::Active;
        self.activated_at = Some(Utc::now());
    }

    pub fn mark_cancelled(&mut self) {
        self.state = TriggerState::Cancelled;
    }

    pub fn mark_completed(&mut self) {
        self.state = TriggerState::Completed;
    }

    /// Evaluate the fire rule against an observed quote.
    ///
    /// Returns false while no threshold is set.
    pub fn should_fire(&self, observed: Price) -> bool {
        self.threshold
            .map(|threshold| self.action().fires_at(observed, threshold))
            .unwrap_or(false)
    }
}

impl fmt::Display for Trigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {} shares of {} for {} @ ",
            self.state, self.key.action, self.share_amount, self.key.stock, self.key.username
        )?;
        match self.threshold {
            Some(price) => write!(f, "{price}")?,
            None => f.write_str("unset")?,
        }
        write!(f, " (transnum {}, id {})", self.transaction_number, self.id)
    }
}

/// A trigger whose condition was observed true, on its way to the ledger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FiredTrigger {
    pub trigger: Trigger,
    /// Quote that satisfied the fire rule.
    pub observed_price: Price,
    pub fired_at: DateTime<Utc>,
}

impl FiredTrigger {
    pub fn new(trigger: Trigger, observed_price: Price) -> Self {
        Self {
            trigger,
            observed_price,
            fired_at: Utc::now(),
        }
    }

    /// Price reported to the ledger: the threshold the order was armed at.
    pub fn fire_price(&self) -> Price {
        self.trigger.threshold.unwrap_or(self.observed_price)
    }

    /// Single-line ledger notification.
    ///
    /// Format: `TRIGGER_SUCCESS,{transnum},{ACTION},{username},{stock},{amount},{price}\n`
    pub fn notification_line(&self) -> String {
        let t = &self.trigger;
        format!(
            "TRIGGER_SUCCESS,{},{},{},{},{},{}\n",
            t.transaction_number,
            t.key.action,
            t.key.username,
            t.key.stock,
            t.share_amount,
            self.fire_price()
        )
    }
}
