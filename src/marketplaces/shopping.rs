//! Google Shopping adapter via SerpAPI.

use super::models::Offer;
use super::{MarketplaceSource, RawResponse};
use crate::countries::Country;
use crate::fx::RateTable;
use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, info};
use wreq::Client;

const SERPAPI_BASE: &str = "https://serpapi.com";
const DEFAULT_MARKETPLACE: &str = "Google Shopping";

/// Native search response of the shopping engine.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ShoppingResponse {
    #[serde(default)]
    shopping_results: Vec<ShoppingItem>,
}

#[derive(Debug, Clone, Deserialize)]
struct ShoppingItem {
    title: Option<String>,
    source: Option<String>,
    link: Option<String>,
    product_link: Option<String>,
    extracted_price: Option<f64>,
    /// Display price, usually a string such as "$1,299.00"
    price: Option<Value>,
}

impl ShoppingItem {
    /// Numeric price from the pre-parsed field, falling back to the display string.
    fn numeric_price(&self) -> Option<f64> {
        let usable = |p: &f64| p.is_finite() && *p > 0.0;

        if let Some(price) = self.extracted_price.filter(usable) {
            return Some(price);
        }

        match self.price.as_ref()? {
            Value::Number(n) => n.as_f64().filter(usable),
            Value::String(s) => parse_display_price(s).filter(usable),
            _ => None,
        }
    }
}

/// Strips everything but digits and dots, then reads the leading decimal number.
///
/// A second dot ends the number, so "1.299.00" reads as 1.299.
fn parse_display_price(text: &str) -> Option<f64> {
    let cleaned: String = text.chars().filter(|c| c.is_ascii_digit() || *c == '.').collect();

    let mut end = cleaned.len();
    if let Some(first) = cleaned.find('.') {
        if let Some(second) = cleaned[first + 1..].find('.') {
            end = first + 1 + second;
        }
    }

    cleaned[..end].parse().ok()
}

/// Maps a shopping response to offers.
///
/// Only the first `limit` results are considered; results without a usable
/// numeric price are skipped. Currency is always the country's local currency.
pub fn to_offers(
    response: ShoppingResponse,
    country: Country,
    rates: &RateTable,
    limit: usize,
) -> Vec<Offer> {
    let currency = country.currency();

    response
        .shopping_results
        .into_iter()
        .take(limit)
        .filter_map(|item| {
            let price = item.numeric_price()?;
            let source = item.source.filter(|s| !s.is_empty());

            Some(Offer {
                country,
                marketplace: source.clone().unwrap_or_else(|| DEFAULT_MARKETPLACE.to_string()),
                title: item.title.unwrap_or_default(),
                url: item.product_link.or(item.link).unwrap_or_default(),
                seller: source.unwrap_or_default(),
                price: Some(price),
                currency: currency.to_string(),
                price_usd: rates.to_usd(Some(price), Some(currency)),
            })
        })
        .collect()
}

/// SerpAPI client for the Google Shopping engine.
pub struct ShoppingClient {
    client: Client,
    base_url: String,
    api_key: String,
}

impl ShoppingClient {
    /// Creates a client against SerpAPI with the given credential.
    pub fn new(api_key: String, timeout: Duration) -> Result<Self> {
        Self::with_base_url(SERPAPI_BASE.to_string(), api_key, timeout)
    }

    /// Creates a client with a custom base URL (for testing).
    pub fn with_base_url(base_url: String, api_key: String, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .connect_timeout(Duration::from_secs(5))
            .build()?;

        Ok(Self { client, base_url, api_key })
    }
}

#[async_trait]
impl MarketplaceSource for ShoppingClient {
    fn name(&self) -> &'static str {
        DEFAULT_MARKETPLACE
    }

    fn supports(&self, _country: Country) -> bool {
        true
    }

    async fn search(&self, query: &str, country: Country) -> Result<RawResponse> {
        let url = format!(
            "{}/search?engine=google_shopping&q={}&api_key={}&gl={}&hl={}",
            self.base_url,
            urlencoding::encode(query),
            urlencoding::encode(&self.api_key),
            country.shopping_gl(),
            country.shopping_hl()
        );

        info!("Searching Google Shopping ({}): {}", country, query);
        // The URL carries the credential; log only the non-secret parts.
        debug!("GET {}/search gl={} hl={}", self.base_url, country.shopping_gl(), country.shopping_hl());

        let response = self
            .client
            .get(&url)
            .header("Accept", "application/json")
            .send()
            .await
            .context("Failed to send request")?;

        if !response.status().is_success() {
            anyhow::bail!("SerpAPI returned status: {}", response.status());
        }

        let body = response.text().await.context("Failed to read response body")?;
        let parsed: ShoppingResponse =
            serde_json::from_str(&body).context("Malformed SerpAPI response")?;

        debug!("Google Shopping {} returned {} results", country, parsed.shopping_results.len());
        Ok(RawResponse::Shopping(parsed))
    }
}
