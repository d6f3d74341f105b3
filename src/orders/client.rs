//! Order API client.
//!
//! One `GET /api/v1/orders` per identity, first page only. Every failure mode
//! comes back as an `OrderApiError`; nothing here panics or retries.

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::StatusCode;
use reqwest::header::{ACCEPT, HeaderValue};
use secrecy::ExposeSecret;
use tracing::{debug, instrument, warn};

use crate::config::LookupConfig;
use crate::error::OrderApiError;
use crate::identity::Identity;
use crate::orders::credential::CredentialProvider;
use crate::orders::model::{DateWindow, Order};

/// Path of the order listing endpoint.
const ORDERS_PATH: &str = "/api/v1/orders";

/// Header carrying the API key.
const API_KEY_HEADER: &str = "apiKey";

/// Anything that can list a customer's orders.
#[async_trait]
pub trait OrderSource: Send + Sync {
    async fn fetch_orders(
        &self,
        identity: &Identity,
        window: &DateWindow,
    ) -> Result<Vec<Order>, OrderApiError>;
}

/// HTTP client for the commerce order API.
#[derive(Clone)]
pub struct OrderClient {
    client: reqwest::Client,
    base_url: String,
    page_limit: u32,
    credentials: Arc<dyn CredentialProvider>,
}

impl std::fmt::Debug for OrderClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OrderClient")
            .field("base_url", &self.base_url)
            .field("page_limit", &self.page_limit)
            .field("credential", &self.credentials.name())
            .finish_non_exhaustive()
    }
}

impl OrderClient {
    /// Build a client for the API described by `config`.
    pub fn new(
        config: &LookupConfig,
        credentials: Arc<dyn CredentialProvider>,
    ) -> Result<Self, OrderApiError> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = config.request_timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| OrderApiError::Transport(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
            page_limit: config.page_limit,
            credentials,
        })
    }

    /// Request URL for one identity, every value percent-encoded.
    pub fn orders_url(&self, identity: &Identity, window: &DateWindow) -> String {
        format!(
            "{}{ORDERS_PATH}?offset=0&limit={}&email={}&date_from={}&date_to={}",
            self.base_url,
            self.page_limit,
            urlencoding::encode(identity.as_str()),
            urlencoding::encode(&window.from_param()),
            urlencoding::encode(&window.to_param()),
        )
    }
}

#[async_trait]
impl OrderSource for OrderClient {
    #[instrument(skip(self, window), fields(identity = %identity))]
    async fn fetch_orders(
        &self,
        identity: &Identity,
        window: &DateWindow,
    ) -> Result<Vec<Order>, OrderApiError> {
        let key = self
            .credentials
            .api_key()
            .ok_or_else(|| OrderApiError::MissingCredential(self.credentials.name().to_string()))?;

        let mut key_header = HeaderValue::from_str(key.expose_secret())
            .map_err(|e| OrderApiError::Transport(format!("invalid API key header: {e}")))?;
        key_header.set_sensitive(true);

        let url = self.orders_url(identity, window);

        let response = self
            .client
            .get(&url)
            .header(API_KEY_HEADER, key_header)
            .header(ACCEPT, HeaderValue::from_static("application/json"))
            .send()
            .await
            .map_err(|e| OrderApiError::Transport(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| OrderApiError::Transport(e.to_string()))?;

        if status != StatusCode::OK {
            warn!(status = status.as_u16(), "Order API returned an error status");
            return Err(OrderApiError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let orders = normalize_orders(&body)?;
        debug!(count = orders.len(), "Fetched orders");
        Ok(orders)
    }
}

/// Turn a 200 response body into an order list.
///
/// A JSON array becomes the order list, every object element kept whatever
/// the shape of its fields. `null` elements are dropped; other non-object
/// elements are dropped with a warning. Any other JSON value (object, null,
/// string) is treated as no orders. A body that is not JSON is
/// `MalformedResponse`.
pub fn normalize_orders(body: &str) -> Result<Vec<Order>, OrderApiError> {
    let value: serde_json::Value = serde_json::from_str(body)
        .map_err(|e| OrderApiError::MalformedResponse(e.to_string()))?;

    let serde_json::Value::Array(items) = value else {
        debug!("Order API body is not an array, treating as no orders");
        return Ok(Vec::new());
    };

    Ok(items
        .into_iter()
        .filter_map(|item| match item {
            serde_json::Value::Null => None,
            serde_json::Value::Object(_) => match serde_json::from_value::<Order>(item) {
                Ok(order) => Some(order),
                Err(e) => {
                    warn!(error = %e, "Skipping unreadable order record");
                    None
                }
            },
            other => {
                warn!(element = %other, "Skipping non-object order record");
                None
            }
        })
        .collect())
}
