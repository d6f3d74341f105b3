//! Email address type and header extraction.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// First `<...>` group in a header value.
static ANGLE_ADDRESS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<([^>]+)>").expect("angle address pattern is valid"));

/// An email address as taken from a message header.
///
/// No RFC 5322 validation is done: whatever the header carried is kept, so a
/// malformed value simply fails to match anything downstream.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EmailAddress(String);

/// One address believed to belong to the customer.
pub type Identity = EmailAddress;

impl EmailAddress {
    pub fn new(address: impl Into<String>) -> Self {
        Self(address.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Everything before the first `@` (the whole value when there is none).
    pub fn local_part(&self) -> &str {
        self.0.split('@').next().unwrap_or_default()
    }

    /// Trimmed, lowercased copy.
    pub fn normalized(&self) -> Self {
        Self(self.0.trim().to_lowercase())
    }

    /// Compare two addresses, exactly or after normalization.
    pub fn matches(&self, other: &EmailAddress, normalize: bool) -> bool {
        if normalize {
            self.normalized() == other.normalized()
        } else {
            self == other
        }
    }
}

impl std::fmt::Display for EmailAddress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for EmailAddress {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// Extract the address from a `From`/`Reply-To` header value.
///
/// `"Jan Kowalski" <jan@example.com>` yields `jan@example.com`; a value with
/// no angle-bracketed part is returned unchanged.
pub fn extract_address(header: &str) -> EmailAddress {
    match ANGLE_ADDRESS.captures(header).and_then(|c| c.get(1)) {
        Some(m) => EmailAddress::new(m.as_str()),
        None => EmailAddress::new(header),
    }
}
