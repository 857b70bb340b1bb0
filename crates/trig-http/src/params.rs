//! Request parameters and their validation.
//!
//! Every field is optional at the extractor level so that a missing or
//! malformed value becomes a 400 with a readable message instead of an
//! extractor rejection.

use serde::Deserialize;

use trig_core::{Action, Price, TriggerKey};

use crate::error::{HttpError, HttpResult};

/// `setTrigger` parameters.
#[derive(Debug, Default, Deserialize)]
pub struct SetParams {
    pub action: Option<String>,
    pub transnum: Option<String>,
    pub username: Option<String>,
    pub stock: Option<String>,
    pub amount: Option<String>,
}

/// `startTrigger` parameters.
#[derive(Debug, Default, Deserialize)]
pub struct StartParams {
    pub action: Option<String>,
    pub username: Option<String>,
    pub stock: Option<String>,
    pub price: Option<String>,
}

/// `cancelTrigger` parameters.
#[derive(Debug, Default, Deserialize)]
pub struct CancelParams {
    pub action: Option<String>,
    pub username: Option<String>,
    pub stock: Option<String>,
}

/// Listing parameters.
#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
    pub format: Option<String>,
}

impl ListParams {
    pub fn wants_json(&self) -> bool {
        self.format.as_deref() == Some("json")
    }
}

/// Validated `setTrigger` request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct SetRequest {
    pub key: TriggerKey,
    pub transaction_number: i64,
    pub share_amount: u64,
}

impl SetParams {
    pub(crate) fn validate(&self) -> HttpResult<SetRequest> {
        let key = parse_key(&self.action, &self.stock, &self.username)?;
        let transnum = required("transnum", &self.transnum)?;
        let transaction_number = transnum.parse::<i64>().map_err(|_| {
            HttpError::Validation(format!("transnum must be an integer, got {transnum:?}"))
        })?;
        let amount = required("amount", &self.amount)?;
        let share_amount = match amount.parse::<u64>() {
            Ok(n) if n > 0 => n,
            _ => {
                return Err(HttpError::Validation(format!(
                    "amount must be a positive integer, got {amount:?}"
                )))
            }
        };

        Ok(SetRequest {
            key,
            transaction_number,
            share_amount,
        })
    }
}

impl StartParams {
    pub(crate) fn validate(&self) -> HttpResult<(TriggerKey, Price)> {
        let key = parse_key(&self.action, &self.stock, &self.username)?;
        let price = required("price", &self.price)?;
        let price = Price::parse_positive(price)
            .map_err(|e| HttpError::Validation(format!("price {price:?}: {e}")))?;
        Ok((key, price))
    }
}

impl CancelParams {
    pub(crate) fn validate(&self) -> HttpResult<TriggerKey> {
        parse_key(&self.action, &self.stock, &self.username)
    }
}

fn required<'a>(name: &str, value: &'a Option<String>) -> HttpResult<&'a str> {
    match value.as_deref().map(str::trim) {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(HttpError::Validation(format!("missing parameter: {name}"))),
    }
}

fn parse_key(
    action: &Option<String>,
    stock: &Option<String>,
    username: &Option<String>,
) -> HttpResult<TriggerKey> {
    let action: Action = required("action", action)?
        .parse()
        .map_err(|e: trig_core::CoreError| HttpError::Validation(e.to_string()))?;
    let stock = required("stock", stock)?;
    let username = required("username", username)?;
    Ok(TriggerKey::new(action, stock, username))
}
