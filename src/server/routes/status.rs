use crate::db::DbStatus;
use crate::error::OrbisError;
use crate::server::router::OrbisState;
use axum::{Json, extract::State};

/// GET /status
pub(super) async fn get_status(State(state): State<OrbisState>) -> Result<Json<DbStatus>, OrbisError> {
    Ok(Json(state.db.status().await?))
}
