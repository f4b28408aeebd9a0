//! HTTP endpoint exposing the price comparison.

pub mod error;
pub mod handler;

use crate::compare::Comparator;
use crate::config::Config;
use anyhow::{Context, Result};
use axum::{routing::any, Router};
use std::sync::Arc;
use tracing::{info, warn};

pub use error::{ApiError, ApiResult};
pub use handler::{compare_prices, validate_request, API_KEY_HEADER};

/// Route serving the comparison.
pub const COMPARE_PATH: &str = "/api/compare-prices";

/// Immutable state shared by every request.
pub struct AppState {
    pub api_key: Option<String>,
    pub comparator: Comparator,
}

impl AppState {
    /// Builds production state from configuration.
    pub fn from_config(config: &Config) -> Result<Self> {
        if config.api_key.is_none() {
            warn!("API_KEY not set, every request will be rejected as unauthorized");
        }

        Ok(Self { api_key: config.api_key.clone(), comparator: Comparator::from_config(config)? })
    }
}

/// Builds the router. Every method is routed so the handler can answer 405 itself.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new().route(COMPARE_PATH, any(compare_prices)).with_state(state)
}

/// Binds `config.bind` and serves until the process is stopped.
pub async fn serve(config: &Config) -> Result<()> {
    let state = Arc::new(AppState::from_config(config)?);

    let listener = tokio::net::TcpListener::bind(&config.bind)
        .await
        .with_context(|| format!("Failed to bind {}", config.bind))?;

    info!("Listening on {}{}", config.bind, COMPARE_PATH);
    axum::serve(listener, router(state)).await.context("Server error")
}
