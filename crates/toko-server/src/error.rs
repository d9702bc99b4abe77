use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use toko_core::error::AppError;

use crate::dto::ErrorResponse;

/// Wrapper so we can implement `IntoResponse` for `AppError`.
#[derive(Debug)]
pub struct ApiError(pub AppError);

impl From<AppError> for ApiError {
    fn from(err: AppError) -> Self {
        Self(err)
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match &self.0 {
            AppError::InvalidQueryParameters(_) | AppError::ValidationError(_) => {
                StatusCode::BAD_REQUEST
            }
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::InvalidPassword(_)
            | AppError::InvalidCredentials(_)
            | AppError::RateLimited => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::DuplicateKey(_) => StatusCode::CONFLICT,
            AppError::HashError(_)
            | AppError::DatabaseError(_)
            | AppError::ConfigError(_)
            | AppError::Generic(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();

        let message = if self.0.is_client_error() {
            self.0.to_string()
        } else {
            tracing::error!(code = self.0.code(), error = %self.0, "Request failed");
            "An internal error occurred".to_string()
        };

        let validation_errors = match self.0 {
            AppError::ValidationError(ref errors) => Some(errors.clone()),
            _ => None,
        };

        let body = ErrorResponse {
            status_code: status.as_u16(),
            error: self.0.code().to_string(),
            description: self.0.description().to_string(),
            message,
            validation_errors,
        };

        (status, axum::Json(body)).into_response()
    }
}

/// Fallback for requests that match no route.
pub async fn route_not_found() -> Response {
    let body = ErrorResponse {
        status_code: StatusCode::NOT_FOUND.as_u16(),
        error: "ROUTE_NOT_FOUND".to_string(),
        description: "Route not found".to_string(),
        message: "Route not found".to_string(),
        validation_errors: None,
    };
    (StatusCode::NOT_FOUND, axum::Json(body)).into_response()
}
