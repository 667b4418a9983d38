//! HTTP rendering of service errors.

use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use mc_core::AppError;
use serde::Serialize;
use std::fmt;
use tracing::error;

/// Error returned by every handler.
#[derive(Debug)]
pub enum ApiError {
    App(AppError),
    /// The request itself could not be read (malformed multipart, bad query value).
    BadRequest(String),
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
    details: Vec<String>,
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::App(err) => write!(f, "{err}"),
            Self::BadRequest(msg) => write!(f, "bad request: {msg}"),
        }
    }
}

impl From<AppError> for ApiError {
    fn from(err: AppError) -> Self {
        Self::App(err)
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        let err = match self {
            Self::BadRequest(_) => return StatusCode::BAD_REQUEST,
            Self::App(err) => err,
        };
        match err {
            AppError::AuthRequired | AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::NotFound(..) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) | AppError::InvalidTransition { .. } => StatusCode::CONFLICT,
            AppError::Upload(_) => StatusCode::BAD_GATEWAY,
            AppError::Backend(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        if status.is_server_error() {
            error!(error = %self, "request failed");
        }

        let (message, details) = match self {
            Self::App(AppError::Validation(errors)) => {
                ("validation failed".to_string(), errors.clone())
            }
            // Infrastructure detail stays in the logs.
            Self::App(AppError::Backend(_) | AppError::Internal(_)) => {
                ("internal server error".to_string(), Vec::new())
            }
            other => (other.to_string(), Vec::new()),
        };

        HttpResponse::build(status).json(ErrorBody {
            error: message,
            details,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::body::to_bytes;

    #[test]
    fn status_mapping() {
        let cases = [
            (AppError::AuthRequired, 401),
            (AppError::Unauthorized("x".into()), 401),
            (AppError::Forbidden("x".into()), 403),
            (AppError::Validation(vec![]), 422),
            (AppError::not_found("listing", 1), 404),
            (AppError::Conflict("x".into()), 409),
            (AppError::InvalidTransition { from: "active".into(), to: "active".into() }, 409),
            (AppError::Upload("x".into()), 502),
            (AppError::Backend("x".into()), 500),
            (AppError::Internal("x".into()), 500),
        ];
        for (err, status) in cases {
            assert_eq!(ApiError::from(err).status_code().as_u16(), status);
        }
        assert_eq!(ApiError::BadRequest("x".into()).status_code(), StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn validation_body_lists_every_message() {
        let err = ApiError::from(AppError::Validation(vec![
            "Brand is required".into(),
            "Model is required".into(),
        ]));
        let body = to_bytes(err.error_response().into_body()).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["error"], "validation failed");
        assert_eq!(json["details"][1], "Model is required");
    }

    #[actix_web::test]
    async fn backend_detail_is_not_leaked() {
        let err = ApiError::from(AppError::Backend("password=hunter2".into()));
        let body = to_bytes(err.error_response().into_body()).await.unwrap();
        assert!(!String::from_utf8_lossy(&body).contains("hunter2"));
    }
}
