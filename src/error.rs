use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde_json::json;
use std::sync::Arc;
use thiserror::Error;

/// Setup failure reported by the single-flight initializer. Cloneable so a
/// shared in-flight future can hand the same failure to every waiter.
#[derive(Clone, Debug, Error)]
#[error("{0}")]
pub struct InitError(Arc<anyhow::Error>);

impl InitError {
    pub fn new(err: anyhow::Error) -> Self {
        Self(Arc::new(err))
    }
}

/// Errors surfaced at the HTTP boundary.
///
/// Validation failures map to 400 with an `{error}` body; everything else is
/// a 500 with `{error, message}` so the caller can decide whether to retry.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    Validation(&'static str),
    #[error("{context}: {message}")]
    Upstream {
        context: &'static str,
        message: String,
    },
    #[error(transparent)]
    Init(#[from] InitError),
}

impl ApiError {
    pub fn upstream(context: &'static str, err: anyhow::Error) -> Self {
        Self::Upstream {
            context,
            message: err.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::Validation(msg) => (
                StatusCode::BAD_REQUEST,
                Json(json!({ "error": msg })),
            )
                .into_response(),
            ApiError::Upstream { context, message } => (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": context, "message": message })),
            )
                .into_response(),
            ApiError::Init(err) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({
                    "error": "Service initialization failed",
                    "message": err.to_string(),
                })),
            )
                .into_response(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_maps_to_400() {
        let response = ApiError::Validation("Search query is required").into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn upstream_maps_to_500() {
        let response = ApiError::upstream("Search failed", anyhow::anyhow!("boom")).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn init_maps_to_500() {
        let err = ApiError::from(InitError::new(anyhow::anyhow!("bootstrap unreachable")));
        assert_eq!(
            err.into_response().status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
