use crate::server::router::OrbisState;
use axum::{
    Router,
    routing::{get, post},
};

pub mod countries;
pub mod status;

/// Unmatched methods on these paths (e.g. `GET /countries/refresh`, `DELETE /countries/image`)
/// fall through to the router-wide `Route not found` reply.
pub fn router() -> Router<OrbisState> {
    Router::new()
        .route("/countries", get(countries::list_countries))
        .route("/countries/refresh", post(countries::refresh_countries))
        // Static segment wins over `{name}`, so `image` is never taken as a country name.
        .route("/countries/image", get(countries::summary_image))
        .route(
            "/countries/{name}",
            get(countries::get_country).delete(countries::delete_country),
        )
        .route("/status", get(status::get_status))
}
