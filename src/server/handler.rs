//! Price comparison endpoint and request validation.

use super::error::{ApiError, ApiResult};
use super::AppState;
use crate::compare::{CompareRequest, ComparisonReport};
use crate::countries::select_countries;
use axum::{
    extract::{Query, State},
    http::{HeaderMap, Method},
    Json,
};
use std::sync::Arc;
use subtle::ConstantTimeEq;
use tracing::debug;

/// Header carrying the caller credential.
pub const API_KEY_HEADER: &str = "x-api-key";

/// `GET /api/compare-prices?brand=..&model=..[&countries=..][&gtin=..]`
pub async fn compare_prices(
    State(state): State<Arc<AppState>>,
    method: Method,
    headers: HeaderMap,
    Query(params): Query<Vec<(String, String)>>,
) -> ApiResult<Json<ComparisonReport>> {
    let request = validate_request(&method, &headers, &params, state.api_key.as_deref())?;
    let report = state.comparator.compare(&request).await?;
    Ok(Json(report))
}

/// Checks method, credential, and required parameters, in that order.
///
/// Nothing leaves the process until this succeeds.
pub fn validate_request(
    method: &Method,
    headers: &HeaderMap,
    params: &[(String, String)],
    expected_key: Option<&str>,
) -> ApiResult<CompareRequest> {
    if *method != Method::GET {
        return Err(ApiError::MethodNotAllowed);
    }

    let provided = headers.get(API_KEY_HEADER).and_then(|h| h.to_str().ok());
    if !credential_matches(provided, expected_key) {
        debug!("Rejected request with missing or invalid API key");
        return Err(ApiError::Unauthorized);
    }

    let (Some(brand), Some(model)) = (first_param(params, "brand"), first_param(params, "model"))
    else {
        return Err(ApiError::BadRequest("brand and model are required".to_string()));
    };

    let countries: Vec<&str> =
        params.iter().filter(|(k, _)| k == "countries").map(|(_, v)| v.as_str()).collect();
    let countries = if countries.is_empty() {
        select_countries::<&str>(None)
    } else {
        select_countries(Some(countries.as_slice()))
    };

    Ok(CompareRequest {
        brand: brand.to_string(),
        model: model.to_string(),
        countries,
        gtin: first_param(params, "gtin").map(str::to_string),
    })
}

/// Constant-time comparison; an unconfigured key rejects everyone.
fn credential_matches(provided: Option<&str>, expected: Option<&str>) -> bool {
    match (provided, expected) {
        (Some(provided), Some(expected)) => provided.as_bytes().ct_eq(expected.as_bytes()).into(),
        _ => false,
    }
}

/// First value for `name`, as sent. Blank values count as missing.
fn first_param<'a>(params: &'a [(String, String)], name: &str) -> Option<&'a str> {
    params
        .iter()
        .find(|(k, _)| k == name)
        .map(|(_, v)| v.as_str())
        .filter(|v| !v.trim().is_empty())
}
