//! Lookup orchestration: from an inbound message to an order result.
//!
//! 1. Fetch the message and extract the sender address
//! 2. Sender is the marketplace notifier → proxy branch: resolve every alias
//!    of the reply-to customer and merge their orders
//! 3. Otherwise → direct branch: the sender is the only identity

use std::sync::Arc;

use chrono::{DateTime, Utc};
use futures::future::join_all;
use secrecy::SecretString;
use serde::Serialize;
use tracing::{info, instrument};

use crate::config::LookupConfig;
use crate::error::MailHostError;
use crate::identity::{EmailAddress, Identity, IdentityResolver, ProxyIdentityMatcher, extract_address};
use crate::mailhost::MailHost;
use crate::orders::{AggregatedResult, DateWindow, OrderSource, SkippedIdentity, aggregate};

/// What triggers one lookup: a message handle and the host access token.
pub struct InboundTrigger {
    pub message_id: String,
    pub access_token: Option<SecretString>,
}

impl InboundTrigger {
    pub fn new(message_id: impl Into<String>) -> Self {
        Self {
            message_id: message_id.into(),
            access_token: None,
        }
    }

    pub fn with_access_token(mut self, token: SecretString) -> Self {
        self.access_token = Some(token);
        self
    }
}

/// Which path a lookup took.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LookupBranch {
    /// Sender is the marketplace notifier; the customer hides behind aliases.
    MarketplaceProxy,
    /// Sender is the customer.
    DirectCustomer,
}

/// Everything one lookup produced.
#[derive(Debug, Clone, Serialize)]
pub struct LookupOutcome {
    /// Address the result is about (reply-to customer or sender).
    pub customer: EmailAddress,
    pub branch: LookupBranch,
    /// Identities queried, in resolution order.
    pub identities: Vec<Identity>,
    pub result: AggregatedResult,
    /// Proxy-branch identities whose fetch failed and were left out.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub skipped: Vec<SkippedIdentity>,
}

/// Drives identity resolution and order retrieval for one message.
pub struct OrderLookup {
    config: LookupConfig,
    host: Arc<dyn MailHost>,
    orders: Arc<dyn OrderSource>,
    resolver: IdentityResolver,
}

impl OrderLookup {
    pub fn new(config: LookupConfig, host: Arc<dyn MailHost>, orders: Arc<dyn OrderSource>) -> Self {
        let matcher = ProxyIdentityMatcher::new(config.proxy_domains.iter().cloned())
            .case_insensitive(config.normalize_addresses);
        let resolver = IdentityResolver::new(Arc::clone(&host), matcher, config.history_limit)
            .normalize_addresses(config.normalize_addresses);
        Self {
            config,
            host,
            orders,
            resolver,
        }
    }

    pub fn config(&self) -> &LookupConfig {
        &self.config
    }

    /// Which branch a sender address selects.
    pub fn classify(&self, sender: &EmailAddress) -> LookupBranch {
        let notifier = EmailAddress::new(self.config.notification_sender.as_str());
        if sender.matches(&notifier, self.config.normalize_addresses) {
            LookupBranch::MarketplaceProxy
        } else {
            LookupBranch::DirectCustomer
        }
    }

    /// Run a lookup with the window ending now.
    pub async fn run(&self, trigger: &InboundTrigger) -> Result<LookupOutcome, MailHostError> {
        self.run_at(trigger, Utc::now()).await
    }

    /// Run a lookup with the window ending at `now`.
    ///
    /// Only a failure to fetch the triggering message is an error; order API
    /// failures are part of the outcome.
    #[instrument(skip(self, trigger), fields(message_id = %trigger.message_id))]
    pub async fn run_at(
        &self,
        trigger: &InboundTrigger,
        now: DateTime<Utc>,
    ) -> Result<LookupOutcome, MailHostError> {
        let message = self
            .host
            .get_message(&trigger.message_id, trigger.access_token.as_ref())
            .await?;

        let sender = extract_address(&message.from);
        let window = DateWindow::since(self.config.history_start, now);

        let outcome = match self.classify(&sender) {
            LookupBranch::MarketplaceProxy => {
                let customer = extract_address(message.reply_to_header());
                self.lookup_proxy(customer, &window).await
            }
            LookupBranch::DirectCustomer => self.lookup_direct(sender, &window).await,
        };

        info!(
            customer = %outcome.customer,
            branch = ?outcome.branch,
            identities = outcome.identities.len(),
            orders = outcome.result.orders().len(),
            skipped = outcome.skipped.len(),
            error = outcome.result.is_error(),
            "Lookup finished"
        );
        Ok(outcome)
    }

    async fn lookup_proxy(&self, customer: EmailAddress, window: &DateWindow) -> LookupOutcome {
        let identities = self.resolver.resolve(&customer).await;

        // join_all yields results in input order, so resolution order is kept.
        let results = join_all(
            identities
                .iter()
                .map(|identity| self.orders.fetch_orders(identity, window)),
        )
        .await;

        let merged = aggregate(identities.iter().cloned().zip(results));
        let skipped = merged.skipped.clone();

        LookupOutcome {
            customer,
            branch: LookupBranch::MarketplaceProxy,
            identities,
            result: merged.into(),
            skipped,
        }
    }

    async fn lookup_direct(&self, sender: EmailAddress, window: &DateWindow) -> LookupOutcome {
        let result = self.orders.fetch_orders(&sender, window).await;
        LookupOutcome {
            identities: vec![sender.clone()],
            customer: sender,
            branch: LookupBranch::DirectCustomer,
            result: result.into(),
            skipped: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Mutex;

    use async_trait::async_trait;
    use chrono::TimeZone;

    use super::*;
    use crate::error::OrderApiError;
    use crate::mailhost::{InMemoryMailHost, MailMessage, MailThread};
    use crate::orders::Order;

    /// Order source answering from a fixed table and recording calls.
    struct StubOrders {
        answers: HashMap<String, Result<Vec<Order>, OrderApiError>>,
        calls: Mutex<Vec<(String, String, String)>>,
    }

    impl StubOrders {
        fn new(answers: Vec<(&str, Result<Vec<Order>, OrderApiError>)>) -> Self {
            Self {
                answers: answers.into_iter().map(|(k, v)| (k.to_string(), v)).collect(),
                calls: Mutex::new(Vec::new()),
            }
        }

        fn called_identities(&self) -> Vec<String> {
            self.calls.lock().unwrap().iter().map(|c| c.0.clone()).collect()
        }
    }

    #[async_trait]
    impl OrderSource for StubOrders {
        async fn fetch_orders(
            &self,
            identity: &Identity,
            window: &DateWindow,
        ) -> Result<Vec<Order>, OrderApiError> {
            self.calls.lock().unwrap().push((
                identity.to_string(),
                window.from_param(),
                window.to_param(),
            ));
            self.answers
                .get(identity.as_str())
                .cloned()
                .unwrap_or_else(|| Ok(Vec::new()))
        }
    }

    fn orders(ids: std::ops::Range<i64>) -> Vec<Order> {
        ids.map(Order::new).collect()
    }

    fn mailbox() -> InMemoryMailHost {
        InMemoryMailHost::with_threads(vec![
            MailThread::new(
                "inbound",
                vec![
                    MailMessage::new("notify-1", "Allegro <powiadomienia@allegro.pl>")
                        .with_reply_to("jan@example.com")
                        .with_to("shop@example.com"),
                ],
            ),
            MailThread::new(
                "old-1",
                vec![
                    MailMessage::new("old-1a", "powiadomienia@allegro.pl")
                        .with_reply_to("jan+aaa@allegromail.pl")
                        .with_to("jan@example.com"),
                ],
            ),
            MailThread::new(
                "old-2",
                vec![
                    MailMessage::new("old-2a", "powiadomienia@allegro.pl")
                        .with_reply_to("jan+bbb@allegromail.com")
                        .with_to("jan@example.com"),
                ],
            ),
            MailThread::new(
                "direct",
                vec![MailMessage::new("direct-1", "\"Anna Nowak\" <anna@example.com>")],
            ),
        ])
    }

    fn lookup(stub: Arc<StubOrders>) -> OrderLookup {
        OrderLookup::new(LookupConfig::new("myshop"), Arc::new(mailbox()), stub)
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 5, 6, 7, 8, 9).unwrap()
    }

    #[tokio::test]
    async fn proxy_branch_merges_aliases_in_discovery_order() {
        let stub = Arc::new(StubOrders::new(vec![
            ("jan+aaa@allegromail.pl", Ok(orders(1..4))),
            ("jan+bbb@allegromail.com", Ok(orders(10..15))),
        ]));
        let outcome = lookup(Arc::clone(&stub))
            .run_at(&InboundTrigger::new("notify-1"), now())
            .await
            .unwrap();

        assert_eq!(outcome.branch, LookupBranch::MarketplaceProxy);
        assert_eq!(outcome.customer.as_str(), "jan@example.com");
        let ids: Vec<String> = outcome.result.orders().iter().filter_map(Order::id_text).collect();
        assert_eq!(ids, vec!["1", "2", "3", "10", "11", "12", "13", "14"]);
        assert_eq!(
            stub.called_identities(),
            vec!["jan+aaa@allegromail.pl", "jan+bbb@allegromail.com"]
        );
    }

    #[tokio::test]
    async fn proxy_branch_absorbs_alias_failures() {
        let stub = Arc::new(StubOrders::new(vec![
            (
                "jan+aaa@allegromail.pl",
                Err(OrderApiError::Transport("connection reset".into())),
            ),
            ("jan+bbb@allegromail.com", Ok(orders(10..12))),
        ]));
        let outcome = lookup(stub)
            .run_at(&InboundTrigger::new("notify-1"), now())
            .await
            .unwrap();

        assert!(!outcome.result.is_error());
        assert_eq!(outcome.result.orders().len(), 2);
        assert_eq!(outcome.skipped.len(), 1);
        assert_eq!(outcome.skipped[0].identity.as_str(), "jan+aaa@allegromail.pl");
    }

    #[tokio::test]
    async fn proxy_branch_without_aliases_has_no_orders() {
        let host = InMemoryMailHost::with_threads(vec![MailThread::new(
            "inbound",
            vec![
                MailMessage::new("notify-1", "powiadomienia@allegro.pl")
                    .with_reply_to("nobody@example.com"),
            ],
        )]);
        let stub = Arc::new(StubOrders::new(Vec::new()));
        let lookup = OrderLookup::new(LookupConfig::new("myshop"), Arc::new(host), stub.clone());
        let outcome = lookup
            .run_at(&InboundTrigger::new("notify-1"), now())
            .await
            .unwrap();

        assert_eq!(outcome.result, AggregatedResult::Orders(Vec::new()));
        assert!(stub.called_identities().is_empty());
    }

    #[tokio::test]
    async fn direct_branch_uses_sender_and_window() {
        let stub = Arc::new(StubOrders::new(vec![("anna@example.com", Ok(orders(5..7)))]));
        let outcome = lookup(Arc::clone(&stub))
            .run_at(&InboundTrigger::new("direct-1"), now())
            .await
            .unwrap();

        assert_eq!(outcome.branch, LookupBranch::DirectCustomer);
        assert_eq!(outcome.customer.as_str(), "anna@example.com");
        assert_eq!(outcome.identities, vec![EmailAddress::from("anna@example.com")]);
        assert_eq!(outcome.result.orders().len(), 2);

        let calls = stub.calls.lock().unwrap().clone();
        assert_eq!(
            calls,
            vec![(
                "anna@example.com".to_string(),
                "2024-12-01 00:00:00".to_string(),
                "2025-05-06 07:08:09".to_string()
            )]
        );
    }

    #[tokio::test]
    async fn direct_branch_error_propagates() {
        let stub = Arc::new(StubOrders::new(vec![(
            "anna@example.com",
            Err(OrderApiError::Status {
                status: 500,
                body: "Internal Server Error".into(),
            }),
        )]));
        let outcome = lookup(stub)
            .run_at(&InboundTrigger::new("direct-1"), now())
            .await
            .unwrap();

        let msg = outcome.result.error().unwrap();
        assert!(msg.contains("500"));
        assert!(outcome.result.orders().is_empty());
    }

    #[tokio::test]
    async fn unknown_message_is_an_error() {
        let stub = Arc::new(StubOrders::new(Vec::new()));
        let err = lookup(stub)
            .run_at(&InboundTrigger::new("missing"), now())
            .await
            .unwrap_err();
        assert!(matches!(err, MailHostError::MessageNotFound { .. }));
    }

    #[test]
    fn classify_is_exact_by_default() {
        let stub = Arc::new(StubOrders::new(Vec::new()));
        let lookup = lookup(stub);
        assert_eq!(
            lookup.classify(&EmailAddress::from("powiadomienia@allegro.pl")),
            LookupBranch::MarketplaceProxy
        );
        assert_eq!(
            lookup.classify(&EmailAddress::from("Powiadomienia@Allegro.pl")),
            LookupBranch::DirectCustomer
        );
    }

    #[test]
    fn classify_normalized_when_enabled() {
        let mut config = LookupConfig::new("myshop");
        config.normalize_addresses = true;
        let lookup = OrderLookup::new(
            config,
            Arc::new(mailbox()),
            Arc::new(StubOrders::new(Vec::new())),
        );
        assert_eq!(
            lookup.classify(&EmailAddress::from(" Powiadomienia@Allegro.pl")),
            LookupBranch::MarketplaceProxy
        );
    }
}
