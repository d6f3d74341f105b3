//! Customer identity resolution.
//!
//! 1. `extract_address()`: canonical address from a raw header value
//! 2. `ProxyIdentityMatcher`: anchored pattern for marketplace proxy aliases
//! 3. `IdentityResolver`: scans mail history for aliases of one real address

pub mod address;
pub mod proxy;
pub mod resolver;

pub use address::{EmailAddress, Identity, extract_address};
pub use proxy::{ProxyAliasPattern, ProxyIdentityMatcher};
pub use resolver::IdentityResolver;
