use crate::config::Config;
use crate::db::DbActorHandle;
use crate::error::{ApiErrorBody, OrbisError};
use crate::ingest::{FactorSource, RandomFactor, UpstreamClient};
use crate::server::routes;
use crate::service::RefreshService;
use crate::summary::SummaryGenerator;

use axum::{
    Json, Router,
    extract::Request,
    http::{HeaderName, HeaderValue, StatusCode, Version, header::USER_AGENT},
    middleware::{self, Next},
    response::{IntoResponse, Response},
};
use base64::Engine as _;
use rand::RngCore;
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info, warn};

const MAX_REQUEST_ID_LEN: usize = 128;
const X_REQUEST_ID: HeaderName = HeaderName::from_static("x-request-id");

fn generate_request_id() -> String {
    // 96 bits => 16 chars base64url (no padding).
    let mut bytes = [0u8; 12];
    rand::rng().fill_bytes(&mut bytes);
    base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(bytes)
}

fn format_http_version(version: Version) -> &'static str {
    match version {
        Version::HTTP_09 => "HTTP/0.9",
        Version::HTTP_10 => "HTTP/1.0",
        Version::HTTP_11 => "HTTP/1.1",
        Version::HTTP_2 => "HTTP/2",
        Version::HTTP_3 => "HTTP/3",
        _ => "HTTP/?",
    }
}

/// Shared state handed to every handler. Cheap to clone.
#[derive(Clone)]
pub struct OrbisState {
    pub db: DbActorHandle,
    pub refresh: RefreshService,
}

impl OrbisState {
    pub fn new(db: DbActorHandle, refresh: RefreshService) -> Self {
        Self { db, refresh }
    }

    /// Wire the refresh pipeline from configuration with a uniformly random GDP factor.
    pub fn from_config(db: DbActorHandle, cfg: &Config) -> Result<Self, OrbisError> {
        let factors: Arc<dyn FactorSource> = Arc::new(RandomFactor::new(
            cfg.summary.gdp_factor_min,
            cfg.summary.gdp_factor_max,
        ));
        Self::with_factor_source(db, cfg, factors)
    }

    pub fn with_factor_source(
        db: DbActorHandle,
        cfg: &Config,
        factors: Arc<dyn FactorSource>,
    ) -> Result<Self, OrbisError> {
        let upstream = UpstreamClient::new(&cfg.upstream)?;
        let summary = SummaryGenerator::from_config(&cfg.summary);
        let refresh = RefreshService::new(db.clone(), upstream, factors, summary);
        Ok(Self::new(db, refresh))
    }
}

async fn not_found_handler() -> Response {
    (StatusCode::NOT_FOUND, Json(ApiErrorBody::new("Route not found"))).into_response()
}

async fn access_log(req: Request, next: Next) -> Response {
    // Capture request metadata before moving `req` into the handler stack.
    let method = req.method().clone();
    let uri = req.uri().clone();
    let version = req.version();

    let request_id = req
        .headers()
        .get(X_REQUEST_ID)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty() && v.len() <= MAX_REQUEST_ID_LEN)
        .map_or_else(generate_request_id, str::to_string);

    let user_agent = req
        .headers()
        .get(USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("-")
        .to_string();

    let start = Instant::now();
    let mut resp = next.run(req).await;

    // Always reflect `x-request-id`, even if the client didn't send one.
    if let Ok(value) = HeaderValue::from_str(&request_id) {
        resp.headers_mut().insert(X_REQUEST_ID, value);
    }

    let status = resp.status();
    let latency_ms = start.elapsed().as_millis();
    let path = uri.path();
    let protocol = format_http_version(version);

    if status.is_server_error() {
        error!(
            "| {:>3} | {} | {:^7} | {:<8} | {} | {}ms | {}",
            status.as_u16(),
            request_id,
            method.as_str(),
            protocol,
            path,
            latency_ms,
            user_agent
        );
    } else if status.is_client_error() {
        warn!(
            "| {:>3} | {} | {:^7} | {:<8} | {} | {}ms | {}",
            status.as_u16(),
            request_id,
            method.as_str(),
            protocol,
            path,
            latency_ms,
            user_agent
        );
    } else {
        info!(
            "| {:>3} | {} | {:^7} | {:<8} | {} | {}ms | {}",
            status.as_u16(),
            request_id,
            method.as_str(),
            protocol,
            path,
            latency_ms,
            user_agent
        );
    }

    resp
}

pub fn orbis_router(state: OrbisState) -> Router {
    Router::new()
        .merge(routes::router())
        .fallback(not_found_handler)
        .method_not_allowed_fallback(not_found_handler)
        .with_state(state)
        .layer(middleware::from_fn(access_log))
}
