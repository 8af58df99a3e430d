use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::Value;
use thiserror::Error;
use tracing::{error, warn};

use crate::utils::response::error as error_response;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Authentication error: {0}")]
    AuthError(String),

    #[error("conflict: unavailable tickets")]
    UnavailableTickets(Vec<String>),

    #[error("Invalid webhook signature: {0}")]
    WebhookSignature(String),

    #[error("Database error")]
    DatabaseError(#[from] sqlx::Error),

    #[error("Upstream request failed with status {status}")]
    Upstream { status: u16, details: Value },

    #[error("External service error: {0}")]
    ExternalServiceError(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Internal server error")]
    InternalServerError(String),
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::ValidationError(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::AuthError(_) => StatusCode::UNAUTHORIZED,
            AppError::UnavailableTickets(_) => StatusCode::CONFLICT,
            AppError::WebhookSignature(_) => StatusCode::BAD_REQUEST,
            AppError::Upstream { status, .. } => StatusCode::from_u16(*status)
                .ok()
                .filter(|s| s.is_client_error() || s.is_server_error())
                .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
            AppError::DatabaseError(_)
            | AppError::ExternalServiceError(_)
            | AppError::Configuration(_)
            | AppError::InternalServerError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            AppError::ValidationError(_) => "VALIDATION_ERROR",
            AppError::NotFound(_) => "NOT_FOUND",
            AppError::AuthError(_) => "AUTH_ERROR",
            AppError::UnavailableTickets(_) => "CONFLICT",
            AppError::WebhookSignature(_) => "INVALID_SIGNATURE",
            AppError::DatabaseError(_) => "DATABASE_ERROR",
            AppError::Upstream { .. } => "UPSTREAM_ERROR",
            AppError::ExternalServiceError(_) => "EXTERNAL_SERVICE_ERROR",
            AppError::Configuration(_) => "CONFIGURATION_ERROR",
            AppError::InternalServerError(_) => "INTERNAL_SERVER_ERROR",
        }
    }

    /// Attaches the empty-collection fallbacks a list route must always return.
    pub fn with_fallback(self, plural: &'static str) -> ListError {
        ListError {
            error: self,
            plural,
        }
    }

    fn log(&self) {
        match self {
            AppError::ValidationError(msg) | AppError::NotFound(msg) | AppError::AuthError(msg) => {
                warn!(code = self.code(), message = %msg, "Request rejected");
            }
            AppError::UnavailableTickets(ids) => {
                warn!(ticket_ids = ?ids, "Checkout rejected: unavailable tickets");
            }
            AppError::WebhookSignature(msg) => {
                warn!(message = %msg, "Webhook signature rejected");
            }
            AppError::Upstream { status, details } => {
                error!(status, details = %details, "Upstream inventory error");
            }
            AppError::ExternalServiceError(msg)
            | AppError::Configuration(msg)
            | AppError::InternalServerError(msg) => {
                error!(error = ?self, message = %msg, "Application error");
            }
            AppError::DatabaseError(e) => {
                error!(error = ?e, "Database error");
            }
        }
    }

    fn public_message(&self) -> String {
        match self {
            AppError::ValidationError(msg)
            | AppError::NotFound(msg)
            | AppError::AuthError(msg)
            | AppError::WebhookSignature(msg)
            | AppError::ExternalServiceError(msg)
            | AppError::Configuration(msg)
            | AppError::InternalServerError(msg) => msg.clone(),
            AppError::UnavailableTickets(_) => self.to_string(),
            AppError::Upstream { .. } => "Upstream inventory request failed".to_string(),
            AppError::DatabaseError(_) => "A database error occurred".to_string(),
        }
    }

    fn details(&self) -> Option<Value> {
        match self {
            AppError::UnavailableTickets(ids) => Some(serde_json::json!({ "unavailable": ids })),
            AppError::Upstream { details, .. } => Some(details.clone()),
            _ => None,
        }
    }

    fn upstream_status(&self) -> Option<u16> {
        match self {
            AppError::Upstream { status, .. } => Some(*status),
            _ => None,
        }
    }

    fn render(self, fallbacks: &[&str]) -> Response {
        let status = self.status_code();

        self.log();

        error_response(
            self.code(),
            self.public_message(),
            self.upstream_status(),
            self.details(),
            fallbacks,
            status,
        )
    }
}

/// Malformed, mistyped or wrongly labelled JSON bodies are plain 400s.
impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::ValidationError(rejection.body_text())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        self.render(&[])
    }
}

/// An [`AppError`] raised by a list route. The body always carries empty
/// arrays under the route's plural key, `results` and `items`.
#[derive(Debug)]
pub struct ListError {
    pub error: AppError,
    pub plural: &'static str,
}

impl IntoResponse for ListError {
    fn into_response(self) -> Response {
        self.error.render(&[self.plural, "results", "items"])
    }
}
