//! HTTP client for the exchange-rate service.

use super::rates::{RateTable, BASE_CURRENCY};
use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, info};
use wreq::Client;

const EXCHANGERATE_BASE: &str = "https://api.exchangerate.host";

/// Trait for exchange-rate lookups - enables mocking for tests.
#[async_trait]
pub trait FxSource: Send + Sync {
    /// Fetches the current USD-based rate table.
    async fn latest(&self) -> Result<RateTable>;
}

#[derive(Debug, Deserialize)]
struct LatestResponse {
    rates: Option<HashMap<String, f64>>,
}

/// Exchange-rate service client.
pub struct FxClient {
    client: Client,
    base_url: String,
}

impl FxClient {
    /// Creates a client against the public exchange-rate service.
    pub fn new(timeout: Duration) -> Result<Self> {
        Self::with_base_url(EXCHANGERATE_BASE.to_string(), timeout)
    }

    /// Creates a client with a custom base URL (for testing).
    pub fn with_base_url(base_url: String, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .connect_timeout(Duration::from_secs(5))
            .build()?;

        Ok(Self { client, base_url })
    }
}

#[async_trait]
impl FxSource for FxClient {
    async fn latest(&self) -> Result<RateTable> {
        let url = format!("{}/latest?base={}", self.base_url, BASE_CURRENCY);
        debug!("GET {}", url);

        let response = self
            .client
            .get(&url)
            .header("Accept", "application/json")
            .send()
            .await
            .context("Failed to send exchange-rate request")?;

        if !response.status().is_success() {
            anyhow::bail!("Exchange-rate service returned status: {}", response.status());
        }

        let body = response.text().await.context("Failed to read exchange-rate body")?;
        let parsed: LatestResponse =
            serde_json::from_str(&body).context("Malformed exchange-rate response")?;

        let rates = parsed.rates.context("Exchange-rate response has no rates")?;
        info!("Loaded {} exchange rates", rates.len());

        Ok(RateTable::new(rates))
    }
}
