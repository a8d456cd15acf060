use axum::{
    Json, Router,
    body::{Body, to_bytes},
    http::{Request, StatusCode},
    response::IntoResponse,
    routing::get,
};
use chrono::{DateTime, Utc};
use orbis::db::{CountryUpsert, DbActorHandle};
use orbis::ingest::{FactorSource, FixedFactor};
use serde_json::{Value, json};
use std::{
    path::PathBuf,
    sync::Arc,
    time::{SystemTime, UNIX_EPOCH},
};
use tokio::net::TcpListener;
use tower::ServiceExt;
use url::Url;

fn unique_temp_path(prefix: &str, suffix: &str) -> PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("system time before UNIX_EPOCH")
        .as_nanos();

    let mut temp_path = std::env::temp_dir();
    temp_path.push(format!(
        "orbis-{prefix}-{}-{}{suffix}",
        std::process::id(),
        nanos
    ));
    temp_path
}

async fn spawn_test_server(app: Router) -> Url {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind listener");
    let addr = listener.local_addr().expect("local addr");
    let base = Url::parse(&format!("http://{}", addr)).expect("valid base url");

    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("server run");
    });

    base
}

/// Upstream stub serving `/countries` and `/rates` with fixed status + JSON.
async fn spawn_upstream(
    countries: (StatusCode, Value),
    rates: (StatusCode, Value),
) -> (Url, Url) {
    let app = Router::new()
        .route(
            "/countries",
            get(move || {
                let (status, body) = countries.clone();
                async move { (status, Json(body)).into_response() }
            }),
        )
        .route(
            "/rates",
            get(move || {
                let (status, body) = rates.clone();
                async move { (status, Json(body)).into_response() }
            }),
        );
    let base = spawn_test_server(app).await;
    (
        base.join("/countries").expect("countries url"),
        base.join("/rates").expect("rates url"),
    )
}

struct TestApp {
    app: Router,
    db: DbActorHandle,
    cfg: orbis::config::Config,
}

async fn build_app(prefix: &str, countries_url: Url, rates_url: Url, factor: u32) -> TestApp {
    let db_path = unique_temp_path(prefix, ".sqlite");
    let database_url = format!("sqlite:{}", db_path.display());
    let db = orbis::db::spawn(&database_url).await.expect("spawn db actor");

    let mut cfg = orbis::config::Config::default();
    cfg.upstream.countries_url = countries_url;
    cfg.upstream.rates_url = rates_url;
    cfg.upstream.timeout_secs = 5;
    cfg.summary.cache_dir = unique_temp_path(prefix, "-cache");

    let factors: Arc<dyn FactorSource> = Arc::new(FixedFactor(factor));
    let state = orbis::server::OrbisState::with_factor_source(db.clone(), &cfg, factors)
        .expect("build state");
    TestApp {
        app: orbis::server::orbis_router(state),
        db,
        cfg,
    }
}

async fn send_json(app: &Router, method: &str, uri: &str) -> (StatusCode, Value) {
    let resp = app
        .clone()
        .oneshot(
            Request::builder()
                .method(method)
                .uri(uri)
                .body(Body::empty())
                .expect("failed to build request"),
        )
        .await
        .expect("request failed");
    let status = resp.status();
    let body = to_bytes(resp.into_body(), usize::MAX)
        .await
        .expect("failed to read response body");
    let value = serde_json::from_slice(&body).expect("response body was not JSON");
    (status, value)
}

fn seeded(name: &str, gdp: f64) -> CountryUpsert {
    CountryUpsert {
        name: name.to_string(),
        capital: Some("Seed City".to_string()),
        region: Some("Seed".to_string()),
        population: 1,
        currency_code: Some("SED".to_string()),
        exchange_rate: Some(1.0),
        estimated_gdp: gdp,
        flag_url: None,
        last_refreshed_at: Utc::now(),
    }
}

#[tokio::test]
async fn refresh_end_to_end_with_fixed_factor() {
    let (countries_url, rates_url) = spawn_upstream(
        (
            StatusCode::OK,
            json!([
                {"name": "Testland", "population": 1000, "currencies": [{"code": "XYZ"}]},
                {"name": "Nocoin", "capital": "Flatville", "region": "Oceania", "population": 50},
                {"name": "Oddland", "population": 10, "currencies": [{"code": "QQQ"}]}
            ]),
        ),
        (StatusCode::OK, json!({"result": "success", "rates": {"XYZ": 2}})),
    )
    .await;
    let t = build_app("refresh-e2e", countries_url, rates_url, 1500).await;

    let (status, body) = send_json(&t.app, "POST", "/countries/refresh").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Countries refreshed successfully");
    let refreshed_at: DateTime<Utc> = body["last_refreshed_at"]
        .as_str()
        .expect("timestamp string")
        .parse()
        .expect("RFC3339 timestamp");

    let (status, row) = send_json(&t.app, "GET", "/countries/Testland").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(row["exchange_rate"], 2.0);
    assert_eq!(row["population"], 1000);
    assert_eq!(row["currency_code"], "XYZ");
    // 1000 * 1500 / 2
    assert_eq!(row["estimated_gdp"], 750_000.0);

    let (_, row) = send_json(&t.app, "GET", "/countries/nocoin").await;
    assert_eq!(row["currency_code"], Value::Null);
    assert_eq!(row["exchange_rate"], Value::Null);
    assert_eq!(row["estimated_gdp"], 0.0);
    assert_eq!(row["capital"], "Flatville");

    let (_, row) = send_json(&t.app, "GET", "/countries/Oddland").await;
    assert_eq!(row["currency_code"], "QQQ");
    assert_eq!(row["exchange_rate"], Value::Null);
    assert_eq!(row["estimated_gdp"], 0.0);

    let (status, body) = send_json(&t.app, "GET", "/status").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total_countries"], 3);
    let status_at: DateTime<Utc> = body["last_refreshed_at"]
        .as_str()
        .expect("timestamp string")
        .parse()
        .expect("RFC3339 timestamp");
    assert_eq!(status_at, refreshed_at);

    // The refresh wrote the summary image to the configured cache.
    let cached = tokio::fs::read(t.cfg.summary.image_path())
        .await
        .expect("summary image written");
    assert_eq!(&cached[..8], b"\x89PNG\r\n\x1a\n");

    // A second refresh overwrites rows instead of duplicating them.
    let (status, _) = send_json(&t.app, "POST", "/countries/refresh").await;
    assert_eq!(status, StatusCode::OK);
    let status = t.db.status().await.unwrap();
    assert_eq!(status.total_countries, 3);
}

#[tokio::test]
async fn random_factor_keeps_gdp_in_bounds() {
    let (countries_url, rates_url) = spawn_upstream(
        (
            StatusCode::OK,
            json!([{"name": "Testland", "population": 1000, "currencies": [{"code": "XYZ"}]}]),
        ),
        (StatusCode::OK, json!({"rates": {"XYZ": 2}})),
    )
    .await;

    let db_path = unique_temp_path("refresh-random", ".sqlite");
    let db = orbis::db::spawn(&format!("sqlite:{}", db_path.display()))
        .await
        .expect("spawn db actor");
    let mut cfg = orbis::config::Config::default();
    cfg.upstream.countries_url = countries_url;
    cfg.upstream.rates_url = rates_url;
    cfg.summary.cache_dir = unique_temp_path("refresh-random", "-cache");
    let app = orbis::server::orbis_router(
        orbis::server::OrbisState::from_config(db.clone(), &cfg).expect("build state"),
    );

    let (status, _) = send_json(&app, "POST", "/countries/refresh").await;
    assert_eq!(status, StatusCode::OK);

    let row = db.get_country("Testland").await.unwrap().expect("stored");
    assert_eq!(row.exchange_rate, Some(2.0));
    assert!(
        (500_000.0..=1_000_000.0).contains(&row.estimated_gdp),
        "gdp {} out of bounds",
        row.estimated_gdp
    );
}

#[tokio::test]
async fn upstream_failure_aborts_without_writes() {
    let countries_ok = (
        StatusCode::OK,
        json!([{"name": "Seedland", "population": 99, "currencies": [{"code": "XYZ"}]}]),
    );

    // Rate source down.
    let (countries_url, rates_url) = spawn_upstream(
        countries_ok.clone(),
        (StatusCode::INTERNAL_SERVER_ERROR, json!({"error": "boom"})),
    )
    .await;
    let t = build_app("refresh-rates-down", countries_url, rates_url, 1000).await;
    t.db.upsert_country(seeded("Seedland", 42.0)).await.unwrap();

    let (status, body) = send_json(&t.app, "POST", "/countries/refresh").await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(
        body,
        json!({
            "error": "External data source unavailable",
            "details": "Could not fetch data from Exchange Rate API"
        })
    );

    let row = t.db.get_country("Seedland").await.unwrap().expect("seed kept");
    assert!((row.estimated_gdp - 42.0).abs() < f64::EPSILON);
    assert_eq!(row.capital.as_deref(), Some("Seed City"));
    let status = t.db.status().await.unwrap();
    assert_eq!(status.total_countries, 1);
    assert_eq!(status.last_refreshed_at, None);

    // Country source down.
    let (countries_url, rates_url) = spawn_upstream(
        (StatusCode::NOT_FOUND, json!({"status": 404})),
        (StatusCode::OK, json!({"rates": {"XYZ": 2}})),
    )
    .await;
    let t = build_app("refresh-countries-down", countries_url, rates_url, 1000).await;

    let (status, body) = send_json(&t.app, "POST", "/countries/refresh").await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(
        body["details"],
        "Could not fetch data from RestCountries API"
    );
    assert_eq!(t.db.status().await.unwrap().total_countries, 0);

    // Country source unreachable (nothing listening).
    let closed = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let dead_url = Url::parse(&format!("http://{}/countries", closed.local_addr().unwrap()))
        .expect("valid url");
    drop(closed);
    let (_, rates_url) = spawn_upstream(countries_ok, (StatusCode::OK, json!({"rates": {}}))).await;
    let t = build_app("refresh-unreachable", dead_url, rates_url, 1000).await;

    let (status, body) = send_json(&t.app, "POST", "/countries/refresh").await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["error"], "External data source unavailable");
    assert_eq!(t.db.status().await.unwrap().total_countries, 0);
}

#[tokio::test]
async fn rate_error_reply_aborts_without_writes() {
    let countries_ok = (
        StatusCode::OK,
        json!([{"name": "Testland", "population": 1000, "currencies": [{"code": "XYZ"}]}]),
    );

    for (prefix, rates_body) in [
        (
            "refresh-rates-quota",
            json!({"result": "error", "error-type": "quota-reached"}),
        ),
        (
            "refresh-rates-flagged",
            json!({"result": "error", "rates": {"XYZ": 2}}),
        ),
    ] {
        let (countries_url, rates_url) =
            spawn_upstream(countries_ok.clone(), (StatusCode::OK, rates_body)).await;
        let t = build_app(prefix, countries_url, rates_url, 1500).await;
        t.db.upsert_country(seeded("Testland", 42.0)).await.unwrap();

        let (status, body) = send_json(&t.app, "POST", "/countries/refresh").await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE, "{prefix}");
        assert_eq!(
            body,
            json!({
                "error": "External data source unavailable",
                "details": "Could not fetch data from Exchange Rate API"
            })
        );

        let row = t.db.get_country("Testland").await.unwrap().expect("seed kept");
        assert_eq!(row.exchange_rate, Some(1.0), "{prefix}");
        assert!((row.estimated_gdp - 42.0).abs() < f64::EPSILON, "{prefix}");
        assert_eq!(t.db.status().await.unwrap().last_refreshed_at, None);
    }
}

#[tokio::test]
async fn non_ascii_names_match_in_any_case() {
    let (countries_url, rates_url) = spawn_upstream(
        (
            StatusCode::OK,
            json!([
                {"name": "Åland Islands", "region": "Europe", "population": 28875,
                 "currencies": [{"code": "EUR"}]},
                {"name": "Curaçao", "region": "Americas", "population": 155014,
                 "currencies": [{"code": "ANG"}]}
            ]),
        ),
        (StatusCode::OK, json!({"result": "success", "rates": {"EUR": 0.5, "ANG": 1.79}})),
    )
    .await;
    let t = build_app("refresh-unicode", countries_url, rates_url, 1000).await;

    let (status, _) = send_json(&t.app, "POST", "/countries/refresh").await;
    assert_eq!(status, StatusCode::OK);

    for uri in [
        "/countries/%C3%85land%20Islands",
        "/countries/%C3%A5land%20islands",
        "/countries/%C3%85LAND%20ISLANDS",
    ] {
        let (status, row) = send_json(&t.app, "GET", uri).await;
        assert_eq!(status, StatusCode::OK, "{uri}");
        assert_eq!(row["name"], "Åland Islands", "{uri}");
    }

    // "CURAÇAO": the upper-case cedilla must fold too.
    let (status, body) = send_json(&t.app, "DELETE", "/countries/CURA%C3%87AO").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"message": "Country deleted"}));
    assert!(t.db.get_country("Curaçao").await.unwrap().is_none());
    assert_eq!(t.db.status().await.unwrap().total_countries, 1);
}

#[tokio::test]
async fn malformed_country_payload_is_upstream_failure() {
    let (countries_url, rates_url) = spawn_upstream(
        (StatusCode::OK, json!({"not": "an array"})),
        (StatusCode::OK, json!({"rates": {"XYZ": 2}})),
    )
    .await;
    let t = build_app("refresh-malformed", countries_url, rates_url, 1000).await;

    let (status, body) = send_json(&t.app, "POST", "/countries/refresh").await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(
        body["details"],
        "Could not fetch data from RestCountries API"
    );
}

#[tokio::test]
async fn invalid_row_rolls_back_the_whole_refresh() {
    let (countries_url, rates_url) = spawn_upstream(
        (
            StatusCode::OK,
            json!([
                {"name": "Goodland", "population": 10, "currencies": [{"code": "XYZ"}]},
                {"name": "", "population": 10}
            ]),
        ),
        (StatusCode::OK, json!({"rates": {"XYZ": 2}})),
    )
    .await;
    let t = build_app("refresh-rollback", countries_url, rates_url, 1000).await;

    let (status, body) = send_json(&t.app, "POST", "/countries/refresh").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, json!({"error": "Internal server error"}));

    let status = t.db.status().await.unwrap();
    assert_eq!(status.total_countries, 0);
    assert_eq!(status.last_refreshed_at, None);
    assert!(t.db.get_country("Goodland").await.unwrap().is_none());
}

#[tokio::test]
async fn render_failure_keeps_committed_rows() {
    let (countries_url, rates_url) = spawn_upstream(
        (
            StatusCode::OK,
            json!([{"name": "Testland", "population": 1000, "currencies": [{"code": "XYZ"}]}]),
        ),
        (StatusCode::OK, json!({"rates": {"XYZ": 2}})),
    )
    .await;

    let db_path = unique_temp_path("refresh-render-fail", ".sqlite");
    let db = orbis::db::spawn(&format!("sqlite:{}", db_path.display()))
        .await
        .expect("spawn db actor");

    // A regular file where the cache directory should be makes every image write fail.
    let blocker = unique_temp_path("refresh-render-fail", "-blocker");
    tokio::fs::write(&blocker, b"not a directory")
        .await
        .expect("write blocker file");

    let mut cfg = orbis::config::Config::default();
    cfg.upstream.countries_url = countries_url;
    cfg.upstream.rates_url = rates_url;
    cfg.summary.cache_dir = blocker.clone();

    let factors: Arc<dyn FactorSource> = Arc::new(FixedFactor(1000));
    let state = orbis::server::OrbisState::with_factor_source(db.clone(), &cfg, factors)
        .expect("build state");

    let outcome = state.refresh.refresh().await.expect("refresh succeeds");
    assert!(!outcome.image_generated);
    assert_eq!(outcome.countries, 1);

    let app = orbis::server::orbis_router(state);
    let (status, body) = send_json(&app, "POST", "/countries/refresh").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Countries refreshed successfully");

    let row = db.get_country("testland").await.unwrap().expect("row committed");
    assert!((row.estimated_gdp - 500_000.0).abs() < f64::EPSILON);
    assert!(db.status().await.unwrap().last_refreshed_at.is_some());

    let _ = tokio::fs::remove_file(&blocker).await;
}
