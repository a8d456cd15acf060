use crate::db::{CountryFilter, CountrySort, DbCountry};
use crate::error::OrbisError;
use crate::server::router::OrbisState;
use axum::{
    Json,
    extract::{Path, Query, State},
    http::header,
    response::{IntoResponse, Response},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    pub region: Option<String>,
    pub currency: Option<String>,
    pub sort: Option<String>,
}

impl From<ListQuery> for CountryFilter {
    fn from(q: ListQuery) -> Self {
        let sort = match q.sort.as_deref() {
            Some("gdp_desc") => CountrySort::GdpDesc,
            _ => CountrySort::Insertion,
        };
        CountryFilter {
            region: q.region.filter(|r| !r.is_empty()),
            currency_code: q.currency.filter(|c| !c.is_empty()),
            sort,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct RefreshResponse {
    pub message: &'static str,
    pub last_refreshed_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: &'static str,
}

/// POST /countries/refresh
pub(super) async fn refresh_countries(
    State(state): State<OrbisState>,
) -> Result<Json<RefreshResponse>, OrbisError> {
    let outcome = state.refresh.refresh().await?;
    info!(
        countries = outcome.countries,
        image_generated = outcome.image_generated,
        "Refresh successful at {}",
        outcome.last_refreshed_at
    );
    Ok(Json(RefreshResponse {
        message: "Countries refreshed successfully",
        last_refreshed_at: outcome.last_refreshed_at,
    }))
}

/// GET /countries?region=..&currency=..&sort=gdp_desc
pub(super) async fn list_countries(
    State(state): State<OrbisState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<DbCountry>>, OrbisError> {
    let filter = CountryFilter::from(query);
    debug!(?filter, "Listing countries");
    Ok(Json(state.db.list_countries(filter).await?))
}

/// GET /countries/{name}
pub(super) async fn get_country(
    State(state): State<OrbisState>,
    Path(name): Path<String>,
) -> Result<Json<DbCountry>, OrbisError> {
    state
        .db
        .get_country(&name)
        .await?
        .map(Json)
        .ok_or(OrbisError::CountryNotFound)
}

/// DELETE /countries/{name}
pub(super) async fn delete_country(
    State(state): State<OrbisState>,
    Path(name): Path<String>,
) -> Result<Json<MessageResponse>, OrbisError> {
    if !state.db.delete_country(&name).await? {
        return Err(OrbisError::CountryNotFound);
    }
    info!(country = %name, "Country deleted");
    Ok(Json(MessageResponse {
        message: "Country deleted",
    }))
}

/// GET /countries/image
pub(super) async fn summary_image(State(state): State<OrbisState>) -> Result<Response, OrbisError> {
    let png = state.refresh.summary_image().await?;
    Ok((
        [
            (header::CONTENT_TYPE, "image/png"),
            (header::CACHE_CONTROL, "no-cache"),
        ],
        png,
    )
        .into_response())
}
