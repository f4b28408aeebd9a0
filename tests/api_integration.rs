//! End-to-end tests for the comparison endpoint against mocked upstreams.

use anyhow::Result;
use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use price_compare::compare::Comparator;
use price_compare::countries::Country;
use price_compare::fx::{FxSource, RateTable};
use price_compare::marketplaces::{MarketplaceSource, RawResponse};
use price_compare::server::{router, AppState, API_KEY_HEADER};
use price_compare::Config;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const API_KEY: &str = "test-key";

fn make_config(server: &MockServer, serpapi_key: Option<&str>) -> Config {
    Config {
        api_key: Some(API_KEY.to_string()),
        serpapi_key: serpapi_key.map(str::to_string),
        timeout_secs: 5,
        fx_url: server.uri(),
        catalog_url: server.uri(),
        shopping_url: server.uri(),
        ..Config::default()
    }
}

fn make_app(config: &Config) -> Router {
    router(Arc::new(AppState::from_config(config).unwrap()))
}

async fn mount_rates(server: &MockServer, body: &str) {
    Mock::given(method("GET"))
        .and(path("/latest"))
        .respond_with(ResponseTemplate::new(200).set_body_string(body.to_string()))
        .mount(server)
        .await;
}

async fn mount_catalog(server: &MockServer, site: &str, status: u16, body: &str) {
    Mock::given(method("GET"))
        .and(path(format!("/sites/{}/search", site)))
        .respond_with(ResponseTemplate::new(status).set_body_string(body.to_string()))
        .mount(server)
        .await;
}

async fn send(app: Router, http_method: &str, uri: &str, key: Option<&str>) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(http_method).uri(uri);
    if let Some(key) = key {
        builder = builder.header(API_KEY_HEADER, key);
    }

    let response = app.oneshot(builder.body(Body::empty()).unwrap()).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);

    (status, json)
}

async fn outbound_calls(server: &MockServer) -> usize {
    server.received_requests().await.map(|r| r.len()).unwrap_or(0)
}

const MXN_RATES: &str = r#"{"base": "USD", "rates": {"MXN": 17.0, "COP": 4000.0}}"#;
const MX_CATALOG: &str = r#"{"results": [{
    "title": "Acme X1",
    "permalink": "https://articulo.mercadolibre.com.mx/MLM-1",
    "price": 1700,
    "currency_id": "MXN",
    "seller": {"nickname": "ACME_OFICIAL"}
}]}"#;

#[tokio::test]
async fn test_single_country_scenario() {
    let server = MockServer::start().await;
    mount_rates(&server, MXN_RATES).await;
    mount_catalog(&server, "MLM", 200, MX_CATALOG).await;

    let app = make_app(&make_config(&server, None));
    let (status, body) =
        send(app, "GET", "/api/compare-prices?brand=Acme&model=X1&countries=MX", Some(API_KEY))
            .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["query"], "Acme X1");
    assert_eq!(body["base_currency"], "USD");
    assert!(body["ts"].as_str().unwrap().ends_with('Z'));

    let offers = body["offers"].as_array().unwrap();
    assert_eq!(offers.len(), 1);
    assert_eq!(offers[0]["country"], "MX");
    assert_eq!(offers[0]["marketplace"], "Mercado Libre");
    assert_eq!(offers[0]["seller"], "ACME_OFICIAL");
    assert_eq!(offers[0]["price"], 1700.0);
    assert_eq!(offers[0]["currency"], "MXN");
    assert_eq!(offers[0]["price_usd"], 100.0);

    let best = &body["summary"]["best_by_country"];
    assert_eq!(best.as_object().unwrap().len(), 1);
    assert_eq!(best["MX"]["price_usd"], 100.0);
    assert_eq!(best["MX"]["marketplace"], "Mercado Libre");
    assert_eq!(best["MX"]["url"], "https://articulo.mercadolibre.com.mx/MLM-1");
}

#[tokio::test]
async fn test_query_joins_raw_brand_and_model() {
    let server = MockServer::start().await;
    mount_rates(&server, MXN_RATES).await;
    Mock::given(method("GET"))
        .and(path("/sites/MLM/search"))
        .and(query_param("q", "Acme  X1"))
        .respond_with(ResponseTemplate::new(200).set_body_string(MX_CATALOG))
        .expect(1)
        .mount(&server)
        .await;

    let app = make_app(&make_config(&server, None));
    let (status, body) = send(
        app,
        "GET",
        "/api/compare-prices?brand=Acme%20&model=X1&countries=MX",
        Some(API_KEY),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["query"], "Acme  X1");
    assert_eq!(body["offers"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_missing_params_make_no_outbound_calls() {
    let server = MockServer::start().await;
    mount_rates(&server, MXN_RATES).await;

    for uri in ["/api/compare-prices?brand=Acme", "/api/compare-prices?model=X1&brand=%20"] {
        let app = make_app(&make_config(&server, Some("serp")));
        let (status, body) = send(app, "GET", uri, Some(API_KEY)).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "brand and model are required");
    }

    assert_eq!(outbound_calls(&server).await, 0);
}

#[tokio::test]
async fn test_bad_credential_is_unauthorized() {
    let server = MockServer::start().await;

    for key in [None, Some("wrong"), Some("test-ke")] {
        let app = make_app(&make_config(&server, None));
        let (status, body) =
            send(app, "GET", "/api/compare-prices?brand=Acme&model=X1", key).await;

        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"], "unauthorized");
    }

    assert_eq!(outbound_calls(&server).await, 0);
}

#[tokio::test]
async fn test_unconfigured_credential_rejects_everyone() {
    let server = MockServer::start().await;
    let config = Config { api_key: None, ..make_config(&server, None) };

    let (status, _) =
        send(make_app(&config), "GET", "/api/compare-prices?brand=Acme&model=X1", None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_wrong_method() {
    let server = MockServer::start().await;
    let app = make_app(&make_config(&server, None));

    let request = Request::builder()
        .method("POST")
        .uri("/api/compare-prices?brand=Acme&model=X1")
        .header(API_KEY_HEADER, API_KEY)
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(response.headers()[header::ALLOW], "GET");
}

#[tokio::test]
async fn test_shopping_disabled_without_key() {
    let server = MockServer::start().await;
    mount_rates(&server, MXN_RATES).await;
    mount_catalog(&server, "MLM", 200, MX_CATALOG).await;
    Mock::given(method("GET"))
        .and(path("/search"))
        .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"shopping_results": []}"#))
        .expect(0)
        .mount(&server)
        .await;

    let app = make_app(&make_config(&server, None));
    let (status, body) =
        send(app, "GET", "/api/compare-prices?brand=Acme&model=X1&countries=MX,US", Some(API_KEY))
            .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["offers"].as_array().unwrap().len(), 1);
    assert!(body["summary"]["best_by_country"]["US"].is_null());
}

#[tokio::test]
async fn test_unsupported_country_dropped() {
    let server = MockServer::start().await;
    mount_rates(&server, MXN_RATES).await;
    mount_catalog(&server, "MLM", 200, MX_CATALOG).await;

    let app = make_app(&make_config(&server, None));
    let (status, body) =
        send(app, "GET", "/api/compare-prices?brand=Acme&model=X1&countries=MX,ZZ", Some(API_KEY))
            .await;

    assert_eq!(status, StatusCode::OK);
    let best = body["summary"]["best_by_country"].as_object().unwrap();
    assert_eq!(best.keys().collect::<Vec<_>>(), vec!["MX"]);
}

#[tokio::test]
async fn test_failed_country_does_not_fail_request() {
    let server = MockServer::start().await;
    mount_rates(&server, MXN_RATES).await;
    mount_catalog(&server, "MLM", 200, MX_CATALOG).await;
    mount_catalog(&server, "MCO", 500, "upstream exploded").await;

    let app = make_app(&make_config(&server, None));
    let (status, body) =
        send(app, "GET", "/api/compare-prices?brand=Acme&model=X1&countries=MX,CO", Some(API_KEY))
            .await;

    assert_eq!(status, StatusCode::OK);
    let offers = body["offers"].as_array().unwrap();
    assert_eq!(offers.len(), 1);
    assert!(offers.iter().all(|o| o["country"] == "MX"));
    assert_eq!(body["summary"]["best_by_country"]["MX"]["price_usd"], 100.0);
    assert!(body["summary"]["best_by_country"]["CO"].is_null());
}

#[tokio::test]
async fn test_rates_unavailable_keeps_offers() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/latest"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;
    mount_catalog(&server, "MLM", 200, MX_CATALOG).await;
    Mock::given(method("GET"))
        .and(path("/search"))
        .and(query_param("gl", "us"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"{"shopping_results": [{"title": "Acme X1", "source": "BestBuy", "extracted_price": 129.999}]}"#,
        ))
        .mount(&server)
        .await;

    let app = make_app(&make_config(&server, Some("serp")));
    let (status, body) =
        send(app, "GET", "/api/compare-prices?brand=Acme&model=X1&countries=MX,US", Some(API_KEY))
            .await;

    assert_eq!(status, StatusCode::OK);
    let offers = body["offers"].as_array().unwrap();
    assert_eq!(offers.len(), 2);

    assert_eq!(offers[0]["currency"], "MXN");
    assert!(offers[0]["price_usd"].is_null());
    assert_eq!(offers[1]["currency"], "USD");
    assert_eq!(offers[1]["price_usd"], 130.0);

    let best = &body["summary"]["best_by_country"];
    assert!(best["MX"].is_null());
    assert_eq!(best["US"]["marketplace"], "BestBuy");
}

#[tokio::test]
async fn test_cheapest_offer_across_sources() {
    let server = MockServer::start().await;
    mount_rates(&server, MXN_RATES).await;
    mount_catalog(&server, "MLM", 200, MX_CATALOG).await;
    Mock::given(method("GET"))
        .and(path("/search"))
        .and(query_param("gl", "mx"))
        .and(query_param("hl", "es"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"{"shopping_results": [
                {"title": "Acme X1 Liverpool", "source": "Liverpool", "price": "$1,530.00", "product_link": "https://liverpool.example/x1"},
                {"title": "Acme X1 sin precio", "source": "Coppel"}
            ]}"#,
        ))
        .mount(&server)
        .await;

    let app = make_app(&make_config(&server, Some("serp")));
    let (status, body) =
        send(app, "GET", "/api/compare-prices?brand=Acme&model=X1&countries=MX", Some(API_KEY))
            .await;

    assert_eq!(status, StatusCode::OK);
    let offers = body["offers"].as_array().unwrap();
    assert_eq!(offers.len(), 2);
    assert_eq!(offers[0]["marketplace"], "Mercado Libre");
    assert_eq!(offers[1]["marketplace"], "Liverpool");
    assert_eq!(offers[1]["price_usd"], 90.0);

    let best = &body["summary"]["best_by_country"]["MX"];
    assert_eq!(best["marketplace"], "Liverpool");
    assert_eq!(best["price_usd"], 90.0);
    assert_eq!(best["title"], "Acme X1 Liverpool");
}

struct StaticRates;

#[async_trait]
impl FxSource for StaticRates {
    async fn latest(&self) -> Result<RateTable> {
        Ok(RateTable::unavailable())
    }
}

struct CrashingSource;

#[async_trait]
impl MarketplaceSource for CrashingSource {
    fn name(&self) -> &'static str {
        "crashing"
    }

    fn supports(&self, _country: Country) -> bool {
        true
    }

    async fn search(&self, _query: &str, _country: Country) -> Result<RawResponse> {
        panic!("adapter bug")
    }
}

#[tokio::test]
async fn test_unexpected_fault_is_internal_error() {
    let state = AppState {
        api_key: Some(API_KEY.to_string()),
        comparator: Comparator::new(
            Arc::new(StaticRates),
            vec![Arc::new(CrashingSource)],
            Duration::from_secs(5),
            8,
        ),
    };

    let (status, body) = send(
        router(Arc::new(state)),
        "GET",
        "/api/compare-prices?brand=Acme&model=X1",
        Some(API_KEY),
    )
    .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, serde_json::json!({"error": "internal_error"}));
}
