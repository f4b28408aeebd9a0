//! USD exchange rates and conversion.

pub mod client;
pub mod rates;

pub use client::{FxClient, FxSource};
pub use rates::{round_cents, RateTable, BASE_CURRENCY};
