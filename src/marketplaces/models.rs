//! Canonical offer model shared by every marketplace adapter.

use crate::countries::Country;
use serde::Serialize;

/// One normalized marketplace listing.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Offer {
    /// Country the listing was searched in
    pub country: Country,
    /// Marketplace or store name
    pub marketplace: String,
    /// Listing title
    pub title: String,
    /// Link to the listing
    pub url: String,
    /// Seller name, empty when unknown
    pub seller: String,
    /// Price in the source's native currency
    pub price: Option<f64>,
    /// Native currency code
    pub currency: String,
    /// Price converted to USD, `None` when no conversion was possible
    pub price_usd: Option<f64>,
}

/// Reduced view of the cheapest offer in a country.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BestOffer {
    pub marketplace: String,
    pub price_usd: f64,
    pub title: String,
    pub url: String,
}

impl BestOffer {
    /// Builds the summary record, if the offer has a USD price.
    pub fn from_offer(offer: &Offer) -> Option<Self> {
        Some(Self {
            marketplace: offer.marketplace.clone(),
            price_usd: offer.price_usd?,
            title: offer.title.clone(),
            url: offer.url.clone(),
        })
    }
}
