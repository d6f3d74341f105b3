//! Marketplace proxy alias matching.
//!
//! The marketplace relays customer mail through addresses such as
//! `jan+a1b2c3@allegromail.pl`: the customer's local part, a per-order token,
//! and one of a few proxy domains.

use regex::{Regex, RegexBuilder};

use crate::identity::address::EmailAddress;

/// Builds alias patterns for a fixed set of proxy domains.
#[derive(Debug, Clone)]
pub struct ProxyIdentityMatcher {
    domains: Vec<String>,
    case_insensitive: bool,
}

impl ProxyIdentityMatcher {
    pub fn new<I, S>(domains: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            domains: domains.into_iter().map(Into::into).collect(),
            case_insensitive: false,
        }
    }

    /// Match aliases regardless of letter case.
    pub fn case_insensitive(mut self, yes: bool) -> Self {
        self.case_insensitive = yes;
        self
    }

    /// Build the alias pattern for `real`.
    ///
    /// Only the local part of `real` is used; its domain is irrelevant since
    /// aliases always live on a proxy domain.
    pub fn build_pattern(&self, real: &EmailAddress) -> ProxyAliasPattern {
        if self.domains.is_empty() {
            return ProxyAliasPattern { regex: None };
        }

        let domains = self
            .domains
            .iter()
            .map(|d| regex::escape(d))
            .collect::<Vec<_>>()
            .join("|");
        let pattern = format!(
            r"^{}\+[a-zA-Z0-9]+@(?:{domains})$",
            regex::escape(real.local_part())
        );

        let regex = RegexBuilder::new(&pattern)
            .case_insensitive(self.case_insensitive)
            .build();

        match regex {
            Ok(regex) => ProxyAliasPattern { regex: Some(regex) },
            Err(e) => {
                tracing::warn!(address = %real, error = %e, "Could not build proxy alias pattern");
                ProxyAliasPattern { regex: None }
            }
        }
    }
}

/// Anchored alias pattern derived from one real address.
#[derive(Debug, Clone)]
pub struct ProxyAliasPattern {
    regex: Option<Regex>,
}

impl ProxyAliasPattern {
    pub fn is_match(&self, candidate: &str) -> bool {
        self.regex.as_ref().is_some_and(|r| r.is_match(candidate))
    }

    /// The candidate as an address when it is an alias.
    pub fn matched(&self, candidate: &EmailAddress) -> Option<EmailAddress> {
        self.is_match(candidate.as_str()).then(|| candidate.clone())
    }

    pub fn as_str(&self) -> Option<&str> {
        self.regex.as_ref().map(Regex::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn matcher() -> ProxyIdentityMatcher {
        ProxyIdentityMatcher::new(["alloweddomain.pl", "alloweddomain.com"])
    }

    #[test]
    fn matches_alias_on_either_domain() {
        let pattern = matcher().build_pattern(&EmailAddress::from("a@b.com"));
        assert!(pattern.is_match("a+xyz123@alloweddomain.pl"));
        assert!(pattern.is_match("a+xyz123@alloweddomain.com"));
    }

    #[test]
    fn rejects_missing_token() {
        let pattern = matcher().build_pattern(&EmailAddress::from("a@b.com"));
        assert!(!pattern.is_match("a@alloweddomain.pl"));
        assert!(!pattern.is_match("a+@alloweddomain.pl"));
    }

    #[test]
    fn rejects_wrong_local_part() {
        let pattern = matcher().build_pattern(&EmailAddress::from("a@b.com"));
        assert!(!pattern.is_match("ax+xyz@alloweddomain.pl"));
        assert!(!pattern.is_match("xa+xyz@alloweddomain.pl"));
    }

    #[test]
    fn rejects_disallowed_domain() {
        let pattern = matcher().build_pattern(&EmailAddress::from("a@b.com"));
        assert!(!pattern.is_match("a+xyz@other.com"));
        assert!(!pattern.is_match("a+xyz@alloweddomain.de"));
        assert!(!pattern.is_match("a+xyz@alloweddomainXpl"));
    }

    #[test]
    fn anchored_at_both_ends() {
        let pattern = matcher().build_pattern(&EmailAddress::from("a@b.com"));
        assert!(!pattern.is_match("xa+xyz@alloweddomain.pl"));
        assert!(!pattern.is_match("a+xyz@alloweddomain.pl.evil.com"));
        assert!(!pattern.is_match("<a+xyz@alloweddomain.pl>"));
    }

    #[test]
    fn token_must_be_alphanumeric() {
        let pattern = matcher().build_pattern(&EmailAddress::from("a@b.com"));
        assert!(!pattern.is_match("a+xy-z@alloweddomain.pl"));
        assert!(!pattern.is_match("a+xy.z@alloweddomain.pl"));
    }

    #[test]
    fn local_part_metacharacters_match_literally() {
        let pattern = matcher().build_pattern(&EmailAddress::from("jan.kowalski@b.com"));
        assert!(pattern.is_match("jan.kowalski+t1@alloweddomain.pl"));
        assert!(!pattern.is_match("janXkowalski+t1@alloweddomain.pl"));
    }

    #[test]
    fn case_sensitive_by_default() {
        let pattern = matcher().build_pattern(&EmailAddress::from("jan@b.com"));
        assert!(!pattern.is_match("Jan+t1@alloweddomain.pl"));

        let pattern = matcher()
            .case_insensitive(true)
            .build_pattern(&EmailAddress::from("jan@b.com"));
        assert!(pattern.is_match("Jan+t1@AllowedDomain.PL"));
    }

    #[test]
    fn no_domains_matches_nothing() {
        let pattern = ProxyIdentityMatcher::new(Vec::<String>::new())
            .build_pattern(&EmailAddress::from("a@b.com"));
        assert!(!pattern.is_match("a+xyz@alloweddomain.pl"));
        assert!(pattern.as_str().is_none());
    }
}
