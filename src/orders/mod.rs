//! Order retrieval from the commerce API.
//!
//! - `model`: `Order`, `DateWindow`
//! - `credential`: where the API key comes from
//! - `client`: `OrderClient`, one GET per identity
//! - `aggregate`: merging per-identity results into one display result

pub mod aggregate;
pub mod client;
pub mod credential;
pub mod model;

pub use aggregate::{AggregatedResult, PartialSuccess, SkippedIdentity, aggregate};
pub use client::{OrderClient, OrderSource, normalize_orders};
pub use credential::{CredentialProvider, EnvCredential, StaticCredential};
pub use model::{DateWindow, Order, OrderId};
