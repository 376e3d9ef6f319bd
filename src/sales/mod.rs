//! Sales API client.
//!
//! Fetches recent orders (or whatever aggregate the endpoint serves) and
//! keeps the last good payload in memory for a short while.

pub mod filter;

pub use filter::{filter_orders, DateRange};

use crate::config::SalesConfig;
use crate::error::ApiError;
use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::{debug, info};

const SERVICE: &str = "Sales API";

/// Keys that may wrap the order list inside an object response.
const LIST_KEYS: [&str; 3] = ["data", "results", "orders"];

/// What the Sales API returned.
#[derive(Debug, Clone, PartialEq)]
pub enum SalesPayload {
    /// A list of order objects.
    Orders(Vec<Value>),
    /// Anything else; passed to the model as-is.
    Opaque(Value),
}

impl SalesPayload {
    /// Classify a decoded response body.
    pub fn from_json(value: Value) -> Self {
        match value {
            Value::Array(orders) => {
                debug!("Sales API returned a list directly");
                SalesPayload::Orders(orders)
            }
            Value::Object(mut map) => {
                for key in LIST_KEYS {
                    if matches!(map.get(key), Some(Value::Array(_))) {
                        debug!("Found order list inside '{}' key", key);
                        if let Some(Value::Array(orders)) = map.remove(key) {
                            return SalesPayload::Orders(orders);
                        }
                    }
                }
                SalesPayload::Opaque(Value::Object(map))
            }
            other => SalesPayload::Opaque(other),
        }
    }
}

/// A source of sales context for the relay.
#[async_trait]
pub trait SalesSource: Send + Sync {
    async fn fetch(&self) -> Result<SalesPayload, ApiError>;
}

struct Cached {
    payload: SalesPayload,
    fetched_at: Instant,
}

/// HTTP client for the Sales API with a time-bounded in-memory cache.
pub struct SalesClient {
    endpoint: String,
    ttl: Duration,
    client: Client,
    cache: Mutex<Option<Cached>>,
}

impl SalesClient {
    pub fn new(config: &SalesConfig, client: Client) -> Self {
        Self {
            endpoint: config.endpoint.clone(),
            ttl: config.cache_ttl(),
            client,
            cache: Mutex::new(None),
        }
    }

    async fn fetch_remote(&self) -> Result<SalesPayload, ApiError> {
        let response = self
            .client
            .get(&self.endpoint)
            .send()
            .await
            .map_err(|e| ApiError::transport(SERVICE, e))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(ApiError::Status {
                service: SERVICE,
                status,
                message: body.trim().to_string(),
            });
        }

        let body = response
            .text()
            .await
            .map_err(|e| ApiError::transport(SERVICE, e))?;
        let value: Value =
            serde_json::from_str(&body).map_err(|e| ApiError::malformed(SERVICE, e))?;
        Ok(SalesPayload::from_json(value))
    }
}

#[async_trait]
impl SalesSource for SalesClient {
    async fn fetch(&self) -> Result<SalesPayload, ApiError> {
        let mut cache = self.cache.lock().await;
        if let Some(cached) = cache.as_ref() {
            if cached.fetched_at.elapsed() < self.ttl {
                info!("Using cached sales data");
                return Ok(cached.payload.clone());
            }
        }

        info!("Fetching sales data from {}", self.endpoint);
        let payload = self.fetch_remote().await?;
        match &payload {
            SalesPayload::Orders(orders) => info!("Sales data fetched ({} orders)", orders.len()),
            SalesPayload::Opaque(_) => info!("Sales data fetched (no order list found)"),
        }
        *cache = Some(Cached {
            payload: payload.clone(),
            fetched_at: Instant::now(),
        });
        Ok(payload)
    }
}
