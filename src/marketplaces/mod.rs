//! Marketplace search adapters and the canonical offer model.

pub mod mercadolibre;
pub mod models;
pub mod shopping;

use crate::countries::Country;
use crate::fx::RateTable;
use anyhow::Result;
use async_trait::async_trait;

pub use mercadolibre::MercadoLibreClient;
pub use models::{BestOffer, Offer};
pub use shopping::ShoppingClient;

/// Untyped-at-the-edge response from one marketplace call.
///
/// Each variant is only ever turned into offers by its own adapter.
#[derive(Debug, Clone)]
pub enum RawResponse {
    Catalog(mercadolibre::CatalogResponse),
    Shopping(shopping::ShoppingResponse),
}

impl RawResponse {
    /// Maps the raw response into offers for `country`, converting prices with `rates`.
    pub fn into_offers(self, country: Country, rates: &RateTable, limit: usize) -> Vec<Offer> {
        match self {
            RawResponse::Catalog(response) => {
                mercadolibre::to_offers(response, country, rates, limit)
            }
            RawResponse::Shopping(response) => shopping::to_offers(response, country, rates, limit),
        }
    }
}

/// A data source that can search for a product in one country.
#[async_trait]
pub trait MarketplaceSource: Send + Sync {
    /// Human-readable source name used in logs.
    fn name(&self) -> &'static str;

    /// Whether this source is queried for `country` at all.
    fn supports(&self, country: Country) -> bool;

    /// Runs one search and returns the source's native response.
    async fn search(&self, query: &str, country: Country) -> Result<RawResponse>;
}
