//! Custom error types for the API service

use auth::AuthError;
use axum::{
    Json,
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use common::StoreError;
use serde_json::json;
use thiserror::Error;

/// Custom error type for the API service
///
/// Store failures, not-found included, surface as 500 with the store's
/// message as detail.
#[derive(Error, Debug)]
pub enum ApiError {
    /// Authentication failed
    #[error("{0}")]
    Unauthorized(String),

    /// Sign-in locked out after repeated failures
    #[error("{0}")]
    TooManyRequests(String),

    /// Internal server error with a detail message
    #[error("{0}")]
    Internal(String),

    /// Store error
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        ApiError::Unauthorized(err.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::TooManyRequests(_) => StatusCode::TOO_MANY_REQUESTS,
            ApiError::Internal(_) | ApiError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = Json(json!({
            "detail": self.to_string(),
        }));

        let mut response = (status, body).into_response();
        if status == StatusCode::UNAUTHORIZED {
            response
                .headers_mut()
                .insert(header::WWW_AUTHENTICATE, HeaderValue::from_static("Bearer"));
        }
        response
    }
}

/// Type alias for API results
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;
    use serde_json::Value;

    async fn detail(response: Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_auth_errors_are_unauthorized_with_challenge() {
        let response = ApiError::from(AuthError::InvalidToken).into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(response.headers()[header::WWW_AUTHENTICATE], "Bearer");
        assert_eq!(detail(response).await, json!({"detail": "Invalid token"}));
    }

    #[tokio::test]
    async fn test_not_found_is_internal_error() {
        let response =
            ApiError::from(StoreError::not_found("bookings", "abc")).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            detail(response).await,
            json!({"detail": "No record with key abc in bookings"})
        );
    }

    #[tokio::test]
    async fn test_too_many_requests() {
        let response = ApiError::TooManyRequests("slow down".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        assert!(response.headers().get(header::WWW_AUTHENTICATE).is_none());
    }
}
