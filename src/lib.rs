//! price-compare - Stateless marketplace price comparison
//!
//! Queries catalog and shopping-search marketplaces for a product, normalizes
//! every offer to USD, and reports the cheapest offer per country.

pub mod compare;
pub mod config;
pub mod countries;
pub mod format;
pub mod fx;
pub mod marketplaces;
pub mod server;

pub use compare::{CompareRequest, Comparator, ComparisonReport};
pub use config::Config;
pub use countries::Country;
pub use marketplaces::{BestOffer, Offer};
