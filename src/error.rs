use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

use crate::geoip::GeoIpError;

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    GeoIp(#[from] GeoIpError),

    #[error(transparent)]
    Database(#[from] sqlx::Error),

    #[error("{0}")]
    InvalidPayload(String),

    #[error(transparent)]
    Json(#[from] JsonRejection),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::GeoIp(e) => {
                tracing::error!("Geo-IP error: {e}");
                StatusCode::INTERNAL_SERVER_ERROR
            }
            AppError::Database(e) => {
                tracing::error!("Database error: {e}");
                StatusCode::INTERNAL_SERVER_ERROR
            }
            AppError::InvalidPayload(message) => {
                tracing::warn!("Rejected payload: {message}");
                StatusCode::BAD_REQUEST
            }
            AppError::Json(rejection) => {
                tracing::warn!("Rejected body: {}", rejection.body_text());
                StatusCode::BAD_REQUEST
            }
        };

        let message = match &self {
            AppError::Json(rejection) => rejection.body_text(),
            other => other.to_string(),
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}
