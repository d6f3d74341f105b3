//! Order lookup: marketplace-aware customer order history for an inbound email.

pub mod cards;
pub mod config;
pub mod error;
pub mod identity;
pub mod lookup;
pub mod mailhost;
pub mod orders;

pub use config::LookupConfig;
pub use error::{Error, Result};
pub use lookup::{InboundTrigger, LookupBranch, LookupOutcome, OrderLookup};
