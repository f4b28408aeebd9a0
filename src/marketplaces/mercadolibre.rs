//! Mercado Libre catalog search adapter.

use super::models::Offer;
use super::{MarketplaceSource, RawResponse};
use crate::countries::Country;
use crate::fx::RateTable;
use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, info};
use wreq::Client;
use wreq_util::Emulation;

const MERCADOLIBRE_BASE: &str = "https://api.mercadolibre.com";
const MARKETPLACE: &str = "Mercado Libre";

/// Native search response of the catalog API.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CatalogResponse {
    #[serde(default)]
    results: Vec<CatalogItem>,
}

#[derive(Debug, Clone, Deserialize)]
struct CatalogItem {
    title: Option<String>,
    permalink: Option<String>,
    price: Option<f64>,
    currency_id: Option<String>,
    seller: Option<CatalogSeller>,
}

#[derive(Debug, Clone, Deserialize)]
struct CatalogSeller {
    nickname: Option<String>,
}

/// Maps a catalog response to offers, keeping the first `limit` results.
pub fn to_offers(
    response: CatalogResponse,
    country: Country,
    rates: &RateTable,
    limit: usize,
) -> Vec<Offer> {
    response
        .results
        .into_iter()
        .take(limit)
        .map(|item| {
            let currency = item
                .currency_id
                .filter(|c| !c.is_empty())
                .unwrap_or_else(|| country.currency().to_string());
            let price_usd = rates.to_usd(item.price, Some(currency.as_str()));

            Offer {
                country,
                marketplace: MARKETPLACE.to_string(),
                title: item.title.unwrap_or_default(),
                url: item.permalink.unwrap_or_default(),
                seller: item.seller.and_then(|s| s.nickname).unwrap_or_default(),
                price: item.price,
                currency,
                price_usd,
            }
        })
        .collect()
}

/// Mercado Libre public search API client.
pub struct MercadoLibreClient {
    client: Client,
    base_url: String,
}

impl MercadoLibreClient {
    /// Creates a client against the public catalog API.
    pub fn new(timeout: Duration) -> Result<Self> {
        Self::with_base_url(MERCADOLIBRE_BASE.to_string(), timeout)
    }

    /// Creates a client with a custom base URL (for testing).
    pub fn with_base_url(base_url: String, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .gzip(true)
            .brotli(true)
            .timeout(timeout)
            .connect_timeout(Duration::from_secs(5))
            .build()?;

        Ok(Self { client, base_url })
    }
}

#[async_trait]
impl MarketplaceSource for MercadoLibreClient {
    fn name(&self) -> &'static str {
        MARKETPLACE
    }

    fn supports(&self, country: Country) -> bool {
        country.catalog_site().is_some()
    }

    async fn search(&self, query: &str, country: Country) -> Result<RawResponse> {
        let Some(site) = country.catalog_site() else {
            anyhow::bail!("Mercado Libre has no site for {}", country);
        };

        let url = format!("{}/sites/{}/search?q={}", self.base_url, site, urlencoding::encode(query));

        info!("Searching Mercado Libre {}: {}", site, query);
        debug!("GET {}", url);

        let response = self
            .client
            .get(&url)
            .emulation(Emulation::Chrome131)
            .header("Accept", "application/json")
            .send()
            .await
            .context("Failed to send request")?;

        if !response.status().is_success() {
            anyhow::bail!("Mercado Libre returned status: {}", response.status());
        }

        let body = response.text().await.context("Failed to read response body")?;
        let parsed: CatalogResponse =
            serde_json::from_str(&body).context("Malformed Mercado Libre response")?;

        debug!("Mercado Libre {} returned {} results", site, parsed.results.len());
        Ok(RawResponse::Catalog(parsed))
    }
}
