use axum::{Json, http::StatusCode, response::IntoResponse};
use serde::Serialize;
use std::fmt;
use thiserror::Error as ThisError;
use tracing::error;

/// Which external collaborator a refresh failed to reach.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpstreamSource {
    Countries,
    Rates,
}

impl UpstreamSource {
    pub fn api_name(self) -> &'static str {
        match self {
            UpstreamSource::Countries => "RestCountries",
            UpstreamSource::Rates => "Exchange Rate",
        }
    }
}

impl fmt::Display for UpstreamSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.api_name())
    }
}

#[derive(Debug, ThisError)]
pub enum OrbisError {
    #[error("{source_name} API unavailable: {reason}")]
    UpstreamUnavailable {
        source_name: UpstreamSource,
        reason: String,
    },

    #[error("Country not found")]
    CountryNotFound,

    #[error("Summary image not found")]
    SummaryImageNotFound,

    #[error("Render error: {0}")]
    Render(String),

    #[error("HTTP request error: {0}")]
    ReqwestError(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Unexpected error: {0}")]
    UnexpectedError(String),

    #[error("Ractor error: {0}")]
    RactorError(String),

    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),
}

impl OrbisError {
    pub fn upstream(source_name: UpstreamSource, reason: impl fmt::Display) -> Self {
        OrbisError::UpstreamUnavailable {
            source_name,
            reason: reason.to_string(),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            OrbisError::UpstreamUnavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
            OrbisError::CountryNotFound | OrbisError::SummaryImageNotFound => {
                StatusCode::NOT_FOUND
            }
            OrbisError::Render(_)
            | OrbisError::ReqwestError(_)
            | OrbisError::JsonError(_)
            | OrbisError::IoError(_)
            | OrbisError::UnexpectedError(_)
            | OrbisError::RactorError(_)
            | OrbisError::DatabaseError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for OrbisError {
    fn into_response(self) -> axum::response::Response {
        let status = self.status();
        let body = match &self {
            OrbisError::UpstreamUnavailable { source_name, .. } => ApiErrorBody {
                error: "External data source unavailable".to_string(),
                details: Some(format!("Could not fetch data from {source_name} API")),
            },
            OrbisError::CountryNotFound | OrbisError::SummaryImageNotFound => {
                ApiErrorBody::new(self.to_string())
            }
            _ => {
                // Internal detail goes to the log only.
                error!(error = %self, "Request failed with internal error");
                ApiErrorBody::new("Internal server error")
            }
        };
        (status, Json(body)).into_response()
    }
}

/// Flat JSON error payload: `{"error": "...", "details": "..."}`.
#[derive(Debug, Serialize)]
pub struct ApiErrorBody {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ApiErrorBody {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            details: None,
        }
    }
}
