//! Configuration types.

use std::time::Duration;

use chrono::NaiveDate;

use crate::error::ConfigError;

/// Marketplace notification sender used when none is configured.
pub const DEFAULT_NOTIFICATION_SENDER: &str = "powiadomienia@allegro.pl";

/// Proxy domains the marketplace relays customer replies through.
pub const DEFAULT_PROXY_DOMAINS: &[&str] = &["allegromail.pl", "allegromail.com"];

/// Number of history threads scanned for proxy aliases.
pub const DEFAULT_HISTORY_LIMIT: usize = 20;

/// Orders requested per identity (single page).
pub const DEFAULT_PAGE_LIMIT: u32 = 50;

/// Host suffix of the commerce panel; the site name is the subdomain.
const PANEL_DOMAIN: &str = "sellasist.pl";

/// Immutable lookup configuration, built once at startup.
#[derive(Debug, Clone)]
pub struct LookupConfig {
    /// Shop subdomain on the commerce panel.
    pub site_name: String,
    /// Sender address of marketplace order notifications.
    pub notification_sender: String,
    /// Domains a proxy alias may live on.
    pub proxy_domains: Vec<String>,
    /// Base URL of the order API (no trailing slash).
    pub api_base_url: String,
    /// First day of the order history window.
    pub history_start: NaiveDate,
    /// Maximum threads inspected when resolving aliases.
    pub history_limit: usize,
    /// `limit` query parameter sent to the order API.
    pub page_limit: u32,
    /// Per-request timeout; `None` leaves the transport default.
    pub request_timeout: Option<Duration>,
    /// Lowercase and trim addresses before comparing them.
    pub normalize_addresses: bool,
}

impl LookupConfig {
    /// Build a config for `site_name` with every other field defaulted.
    pub fn new(site_name: impl Into<String>) -> Self {
        let site_name = site_name.into();
        Self {
            api_base_url: format!("https://{site_name}.{PANEL_DOMAIN}"),
            site_name,
            notification_sender: DEFAULT_NOTIFICATION_SENDER.to_string(),
            proxy_domains: DEFAULT_PROXY_DOMAINS.iter().map(|d| d.to_string()).collect(),
            history_start: default_history_start(),
            history_limit: DEFAULT_HISTORY_LIMIT,
            page_limit: DEFAULT_PAGE_LIMIT,
            request_timeout: None,
            normalize_addresses: false,
        }
    }

    /// Build config from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build config from an arbitrary key lookup (environment, file, test map).
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let site_name = get("ORDER_LOOKUP_SITE")
            .ok_or_else(|| ConfigError::MissingEnvVar("ORDER_LOOKUP_SITE".into()))?;

        let mut config = Self::new(site_name);

        if let Some(sender) = get("ORDER_LOOKUP_NOTIFICATION_SENDER") {
            config.notification_sender = sender;
        }

        if let Some(domains) = get("ORDER_LOOKUP_PROXY_DOMAINS") {
            let domains: Vec<String> = domains
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect();
            if domains.is_empty() {
                return Err(ConfigError::InvalidValue {
                    key: "ORDER_LOOKUP_PROXY_DOMAINS".into(),
                    message: "at least one domain is required".into(),
                });
            }
            config.proxy_domains = domains;
        }

        if let Some(base) = get("ORDER_LOOKUP_API_BASE_URL") {
            config.api_base_url = base.trim_end_matches('/').to_string();
        }

        if let Some(start) = get("ORDER_LOOKUP_HISTORY_START") {
            config.history_start =
                NaiveDate::parse_from_str(&start, "%Y-%m-%d").map_err(|e| {
                    ConfigError::InvalidValue {
                        key: "ORDER_LOOKUP_HISTORY_START".into(),
                        message: e.to_string(),
                    }
                })?;
        }

        if let Some(limit) = get("ORDER_LOOKUP_HISTORY_LIMIT") {
            config.history_limit = parse_number("ORDER_LOOKUP_HISTORY_LIMIT", &limit)?;
        }

        if let Some(limit) = get("ORDER_LOOKUP_PAGE_LIMIT") {
            config.page_limit = parse_number("ORDER_LOOKUP_PAGE_LIMIT", &limit)?;
        }

        if let Some(secs) = get("ORDER_LOOKUP_TIMEOUT_SECS") {
            let secs: u64 = parse_number("ORDER_LOOKUP_TIMEOUT_SECS", &secs)?;
            config.request_timeout = Some(Duration::from_secs(secs));
        }

        config.normalize_addresses = get("ORDER_LOOKUP_NORMALIZE_ADDRESSES")
            .is_some_and(|v| matches!(v.to_ascii_lowercase().as_str(), "1" | "true" | "yes"));

        Ok(config)
    }

    /// Admin panel link for a single order; the id is percent-encoded.
    pub fn order_admin_url(&self, order_id: &str) -> String {
        format!(
            "https://{}.{PANEL_DOMAIN}/admin/orders/edit/{}",
            self.site_name,
            urlencoding::encode(order_id)
        )
    }
}

fn default_history_start() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 12, 1).unwrap_or_default()
}

fn parse_number<T>(key: &str, value: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    value.parse().map_err(|e: T::Err| ConfigError::InvalidValue {
        key: key.to_string(),
        message: e.to_string(),
    })
}
