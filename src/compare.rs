//! Price comparison pipeline: FX fetch, marketplace fan-out, best-price selection.

use crate::config::Config;
use crate::countries::Country;
use crate::fx::{FxClient, FxSource, RateTable, BASE_CURRENCY};
use crate::marketplaces::{
    BestOffer, MarketplaceSource, MercadoLibreClient, Offer, RawResponse, ShoppingClient,
};
use anyhow::{Context, Result};
use chrono::{SecondsFormat, Utc};
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

/// A validated comparison request.
#[derive(Debug, Clone, PartialEq)]
pub struct CompareRequest {
    pub brand: String,
    pub model: String,
    pub countries: Vec<Country>,
    /// Accepted for forward compatibility; not used by any source yet
    pub gtin: Option<String>,
}

impl CompareRequest {
    /// Text query sent to every marketplace.
    ///
    /// Brand and model are joined as given and only the outer ends are trimmed.
    pub fn query(&self) -> String {
        format!("{} {}", self.brand, self.model).trim().to_string()
    }
}

/// Final payload returned to callers.
#[derive(Debug, Clone, Serialize)]
pub struct ComparisonReport {
    pub query: String,
    pub ts: String,
    pub base_currency: String,
    pub offers: Vec<Offer>,
    pub summary: Summary,
}

#[derive(Debug, Clone, Serialize)]
pub struct Summary {
    pub best_by_country: BTreeMap<Country, Option<BestOffer>>,
}

impl ComparisonReport {
    /// Assembles the report, stamping it with the current time.
    pub fn new(
        query: String,
        offers: Vec<Offer>,
        best_by_country: BTreeMap<Country, Option<BestOffer>>,
    ) -> Self {
        Self {
            query,
            ts: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
            base_currency: BASE_CURRENCY.to_string(),
            offers,
            summary: Summary { best_by_country },
        }
    }
}

/// Picks the cheapest USD-priced offer for each requested country.
///
/// Ties keep the first offer encountered. Countries without any USD-priced
/// offer map to `None`.
pub fn best_by_country(
    offers: &[Offer],
    countries: &[Country],
) -> BTreeMap<Country, Option<BestOffer>> {
    countries
        .iter()
        .map(|&country| {
            let mut best: Option<(&Offer, f64)> = None;

            for offer in offers.iter().filter(|o| o.country == country) {
                let Some(price) = offer.price_usd else {
                    continue;
                };
                if best.map_or(true, |(_, lowest)| price < lowest) {
                    best = Some((offer, price));
                }
            }

            (country, best.and_then(|(offer, _)| BestOffer::from_offer(offer)))
        })
        .collect()
}

/// Runs one comparison per request against a fixed set of sources.
pub struct Comparator {
    fx: Arc<dyn FxSource>,
    sources: Vec<Arc<dyn MarketplaceSource>>,
    timeout: Duration,
    max_results: usize,
}

impl Comparator {
    /// Creates a comparator from explicit parts.
    pub fn new(
        fx: Arc<dyn FxSource>,
        sources: Vec<Arc<dyn MarketplaceSource>>,
        timeout: Duration,
        max_results: usize,
    ) -> Self {
        Self { fx, sources, timeout, max_results }
    }

    /// Builds the production comparator from configuration.
    ///
    /// The shopping source is only registered when its credential is set.
    pub fn from_config(config: &Config) -> Result<Self> {
        let timeout = config.timeout();

        let fx = FxClient::with_base_url(config.fx_url.clone(), timeout)
            .context("Failed to create exchange-rate client")?;

        let mut sources: Vec<Arc<dyn MarketplaceSource>> = vec![Arc::new(
            MercadoLibreClient::with_base_url(config.catalog_url.clone(), timeout)
                .context("Failed to create Mercado Libre client")?,
        )];

        match &config.serpapi_key {
            Some(key) => sources.push(Arc::new(
                ShoppingClient::with_base_url(config.shopping_url.clone(), key.clone(), timeout)
                    .context("Failed to create SerpAPI client")?,
            )),
            None => info!("SERPAPI_KEY not set, Google Shopping search disabled"),
        }

        Ok(Self::new(Arc::new(fx), sources, timeout, config.max_results))
    }

    /// Executes the full pipeline for one request.
    ///
    /// Source failures and timeouts contribute no offers. Only a crashed search
    /// task fails the comparison as a whole. Dropping the returned future aborts
    /// every search still in flight.
    pub async fn compare(&self, request: &CompareRequest) -> Result<ComparisonReport> {
        let query = request.query();
        info!("Comparing prices for '{}' in {:?}", query, request.countries);

        let mut slices = Vec::new();
        let mut searches = JoinSet::new();
        for source in &self.sources {
            for &country in request.countries.iter().filter(|&&c| source.supports(c)) {
                let source = Arc::clone(source);
                let query = query.clone();
                let timeout = self.timeout;
                let index = slices.len();
                slices.push(country);
                searches.spawn(async move {
                    (index, search_slice(source.as_ref(), &query, country, timeout).await)
                });
            }
        }
        debug!("Dispatched {} marketplace searches", searches.len());

        let mut responses: Vec<Option<RawResponse>> =
            std::iter::repeat_with(|| None).take(slices.len()).collect();
        let gather = async move {
            while let Some(joined) = searches.join_next().await {
                let (index, raw) = joined.context("Marketplace search task failed")?;
                responses[index] = raw;
            }
            Ok::<_, anyhow::Error>(responses)
        };

        let rates = fetch_rates(self.fx.as_ref(), self.timeout);
        let (rates, responses) = tokio::join!(rates, gather);
        let responses = responses?;

        let offers: Vec<Offer> = responses
            .into_iter()
            .zip(slices)
            .flat_map(|(raw, country)| {
                raw.map(|r| r.into_offers(country, &rates, self.max_results)).unwrap_or_default()
            })
            .collect();

        let best = best_by_country(&offers, &request.countries);
        info!("Collected {} offers for '{}'", offers.len(), query);

        Ok(ComparisonReport::new(query, offers, best))
    }
}

/// Fetches rates, degrading to an empty table on any failure.
async fn fetch_rates(fx: &dyn FxSource, timeout: Duration) -> RateTable {
    match tokio::time::timeout(timeout, fx.latest()).await {
        Ok(Ok(rates)) => rates,
        Ok(Err(e)) => {
            warn!("Exchange rates unavailable: {:#}", e);
            RateTable::unavailable()
        }
        Err(_) => {
            warn!("Exchange rates timed out after {:?}", timeout);
            RateTable::unavailable()
        }
    }
}

/// Runs one source/country search; failures yield `None`.
async fn search_slice(
    source: &dyn MarketplaceSource,
    query: &str,
    country: Country,
    timeout: Duration,
) -> Option<RawResponse> {
    match tokio::time::timeout(timeout, source.search(query, country)).await {
        Ok(Ok(raw)) => Some(raw),
        Ok(Err(e)) => {
            warn!("{} search failed for {}: {:#}", source.name(), country, e);
            None
        }
        Err(_) => {
            warn!("{} search timed out for {} after {:?}", source.name(), country, timeout);
            None
        }
    }
}
