//! Alias discovery over mail history.

use std::collections::HashSet;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::identity::address::{EmailAddress, Identity, extract_address};
use crate::identity::proxy::ProxyIdentityMatcher;
use crate::mailhost::MailHost;

/// Finds the proxy aliases a customer has written from.
pub struct IdentityResolver {
    host: Arc<dyn MailHost>,
    matcher: ProxyIdentityMatcher,
    history_limit: usize,
    normalize: bool,
}

impl IdentityResolver {
    pub fn new(host: Arc<dyn MailHost>, matcher: ProxyIdentityMatcher, history_limit: usize) -> Self {
        Self {
            host,
            matcher,
            history_limit,
            normalize: false,
        }
    }

    /// Deduplicate aliases on their normalized form.
    pub fn normalize_addresses(mut self, yes: bool) -> Self {
        self.normalize = yes;
        self
    }

    /// Resolve every alias of `real` seen in recent history.
    ///
    /// Searches at most `history_limit` threads and inspects only the first
    /// message of each, assuming a thread keeps one reply-to throughout.
    /// Aliases come back in discovery order, each once. A failed search is
    /// treated as empty history.
    pub async fn resolve(&self, real: &EmailAddress) -> Vec<Identity> {
        let pattern = self.matcher.build_pattern(real);

        let threads = match self.host.search(real.as_str(), 0, self.history_limit).await {
            Ok(threads) => threads,
            Err(e) => {
                warn!(address = %real, error = %e, "History search failed, no aliases resolved");
                return Vec::new();
            }
        };

        let mut seen = HashSet::new();
        let mut aliases = Vec::new();

        for thread in &threads {
            let Some(first) = thread.first_message() else {
                continue;
            };

            let candidate = extract_address(first.reply_to_header());
            let Some(alias) = pattern.matched(&candidate) else {
                continue;
            };

            let key = if self.normalize {
                alias.normalized()
            } else {
                alias.clone()
            };
            if seen.insert(key) {
                debug!(thread = %thread.id, alias = %alias, "Found proxy alias");
                aliases.push(alias);
            }
        }

        debug!(
            address = %real,
            threads = threads.len(),
            aliases = aliases.len(),
            "Identity resolution finished"
        );
        aliases
    }
}
