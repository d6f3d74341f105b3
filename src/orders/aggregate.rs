//! Merging per-identity order results.
//!
//! Two paths:
//! - several identities (proxy aliases): failures are set aside in
//!   `PartialSuccess::skipped` and the rest of the orders are still shown
//! - one identity (direct customer): a failure becomes the whole result

use serde::Serialize;
use tracing::warn;

use crate::error::OrderApiError;
use crate::identity::Identity;
use crate::orders::model::Order;

/// The single result of one lookup: an error line or a list of orders.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AggregatedResult {
    Error(String),
    Orders(Vec<Order>),
}

impl AggregatedResult {
    pub fn orders(&self) -> &[Order] {
        match self {
            Self::Orders(orders) => orders,
            Self::Error(_) => &[],
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            Self::Error(msg) => Some(msg),
            Self::Orders(_) => None,
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error(_))
    }
}

impl From<Result<Vec<Order>, OrderApiError>> for AggregatedResult {
    fn from(result: Result<Vec<Order>, OrderApiError>) -> Self {
        match result {
            Ok(orders) => Self::Orders(orders),
            Err(e) => Self::Error(e.to_string()),
        }
    }
}

/// An identity whose fetch failed during a multi-identity lookup.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkippedIdentity {
    pub identity: Identity,
    #[serde(serialize_with = "serialize_error")]
    pub error: OrderApiError,
}

fn serialize_error<S: serde::Serializer>(e: &OrderApiError, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_str(&e.to_string())
}

/// Orders merged across identities, plus the identities that failed.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PartialSuccess {
    pub orders: Vec<Order>,
    pub skipped: Vec<SkippedIdentity>,
}

impl From<PartialSuccess> for AggregatedResult {
    /// Skipped identities contribute nothing; the result is always orders.
    fn from(partial: PartialSuccess) -> Self {
        Self::Orders(partial.orders)
    }
}

/// Concatenate per-identity results in the order given.
///
/// Orders repeated across identities are kept; there is no key to dedupe on.
pub fn aggregate<I>(results: I) -> PartialSuccess
where
    I: IntoIterator<Item = (Identity, Result<Vec<Order>, OrderApiError>)>,
{
    let mut merged = PartialSuccess::default();
    for (identity, result) in results {
        match result {
            Ok(orders) => merged.orders.extend(orders),
            Err(error) => {
                warn!(identity = %identity, error = %error, "Skipping identity, order fetch failed");
                merged.skipped.push(SkippedIdentity { identity, error });
            }
        }
    }
    merged
}
