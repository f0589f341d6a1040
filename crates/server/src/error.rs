//! Unified error handling with Sentry integration.
//!
//! Provides a unified `AppError` type that captures errors to Sentry before
//! responding to the client. All route handlers should return `Result<T, AppError>`.
//!
//! Responses are JSON: `{"error": "..."}`, plus `fields` for form validation
//! and `columns` for rejected CSV headers.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

use crate::backend::BackendError;
use crate::db::RepositoryError;
use crate::forms::ValidationErrors;
use crate::retry::Transient;
use crate::services::auth::AuthError;
use crate::services::gate::GateError;
use crate::services::manifest::ManifestError;
use crate::services::palette::PaletteError;
use crate::services::product_csv::CsvImportError;

/// Attached to every `AppError` response so HTML routes can re-render it.
#[derive(Debug, Clone)]
pub struct ErrorSummary {
    pub message: String,
}

/// Application-level error type for the server.
#[derive(Debug, Error)]
pub enum AppError {
    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(#[from] RepositoryError),

    /// Backend service call failed.
    #[error("Backend error: {0}")]
    Backend(#[from] BackendError),

    /// Sign-in or recovery failed.
    #[error("Auth error: {0}")]
    Auth(#[from] AuthError),

    /// Palette extraction failed.
    #[error("Palette error: {0}")]
    Palette(#[from] PaletteError),

    /// CSV import was rejected.
    #[error("CSV error: {0}")]
    CsvImport(#[from] CsvImportError),

    /// Manifest publishing failed.
    #[error("Manifest error: {0}")]
    Manifest(#[from] ManifestError),

    /// Form input failed validation.
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationErrors),

    /// Gate submission was rejected.
    #[error("Gate error: {0}")]
    Gate(#[from] GateError),

    /// Session store failed.
    #[error("Session error: {0}")]
    Session(#[from] tower_sessions::session::Error),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// User is not authenticated.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// User lacks the role for this action.
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Rate limited.
    #[error("Rate limited")]
    RateLimited,

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// HTTP status for this error.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Database(err) => repository_status(err),
            Self::Backend(err) => backend_status(err),
            Self::Auth(err) => match err {
                AuthError::InvalidEmail | AuthError::MissingPassword => {
                    StatusCode::UNPROCESSABLE_ENTITY
                }
                AuthError::InvalidCredentials => StatusCode::UNAUTHORIZED,
                AuthError::RateLimited(_) => StatusCode::TOO_MANY_REQUESTS,
                AuthError::Backend(inner) => backend_status(inner),
            },
            Self::Palette(err) => match err {
                PaletteError::Fetch(_) | PaletteError::Status(_) => StatusCode::BAD_GATEWAY,
                PaletteError::TooLarge
                | PaletteError::Decode(_)
                | PaletteError::NoOpaquePixels => StatusCode::UNPROCESSABLE_ENTITY,
                PaletteError::Task(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::CsvImport(err) => match err {
                CsvImportError::Repository(inner) => repository_status(inner),
                CsvImportError::MissingColumns(_)
                | CsvImportError::Empty
                | CsvImportError::Malformed(_) => StatusCode::UNPROCESSABLE_ENTITY,
            },
            Self::Manifest(err) => match err {
                ManifestError::Incomplete(_) => StatusCode::UNPROCESSABLE_ENTITY,
                ManifestError::Backend(inner) => backend_status(inner),
                ManifestError::Repository(inner) => repository_status(inner),
                ManifestError::Serialize(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::Gate(_) | Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            Self::Session(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Client-safe message. Internal details are never included.
    #[must_use]
    pub fn public_message(&self) -> String {
        match self {
            Self::Database(RepositoryError::NotFound) => "Not found".to_string(),
            Self::Database(RepositoryError::Conflict(msg)) => msg.clone(),
            Self::Database(err) if err.is_transient() => {
                "Service temporarily unavailable".to_string()
            }
            Self::Backend(BackendError::InvalidCredentials)
            | Self::Auth(AuthError::InvalidCredentials) => "Invalid credentials".to_string(),
            Self::Auth(AuthError::InvalidEmail | AuthError::MissingPassword) => self.inner_message(),
            Self::Backend(BackendError::RateLimited(_))
            | Self::Auth(AuthError::RateLimited(_))
            | Self::RateLimited => {
                "Too many requests, please try again later".to_string()
            }
            Self::Backend(_)
            | Self::Auth(AuthError::Backend(_))
            | Self::Manifest(ManifestError::Backend(_)) => {
                "External service error".to_string()
            }
            Self::Palette(PaletteError::Fetch(_) | PaletteError::Status(_)) => {
                "Could not fetch the logo image".to_string()
            }
            Self::Palette(PaletteError::Task(_)) => "Internal server error".to_string(),
            Self::Palette(err) => err.to_string(),
            Self::CsvImport(CsvImportError::Repository(_)) => "Internal server error".to_string(),
            Self::CsvImport(err) => err.to_string(),
            Self::Manifest(ManifestError::Incomplete(_)) | Self::Gate(_) => {
                self.inner_message()
            }
            Self::Validation(_) => "Validation failed".to_string(),
            Self::NotFound(_) => "Not found".to_string(),
            Self::Unauthorized(_) => "Authentication required".to_string(),
            Self::Forbidden(msg) | Self::BadRequest(msg) => msg.clone(),
            Self::Database(_) | Self::Manifest(_) | Self::Session(_) | Self::Internal(_) => {
                "Internal server error".to_string()
            }
        }
    }

    fn inner_message(&self) -> String {
        match self {
            Self::Manifest(err) => err.to_string(),
            Self::Auth(err) => err.to_string(),
            Self::Gate(err) => err.to_string(),
            _ => self.to_string(),
        }
    }

    fn is_server_error(&self) -> bool {
        self.status().is_server_error()
    }
}

fn repository_status(err: &RepositoryError) -> StatusCode {
    match err {
        RepositoryError::NotFound => StatusCode::NOT_FOUND,
        RepositoryError::Conflict(_) => StatusCode::CONFLICT,
        err if err.is_transient() => StatusCode::SERVICE_UNAVAILABLE,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn backend_status(err: &BackendError) -> StatusCode {
    match err {
        BackendError::InvalidCredentials => StatusCode::UNAUTHORIZED,
        BackendError::RateLimited(_) => StatusCode::TOO_MANY_REQUESTS,
        err if err.is_transient() => StatusCode::SERVICE_UNAVAILABLE,
        _ => StatusCode::BAD_GATEWAY,
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Capture server errors to Sentry
        if self.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        }

        let status = self.status();
        let message = self.public_message();
        let mut body = json!({ "error": message });

        match &self {
            Self::Validation(errors) => body["fields"] = json!(errors.errors),
            Self::CsvImport(CsvImportError::MissingColumns(columns)) => {
                body["columns"] = json!(columns);
            }
            Self::Manifest(ManifestError::Incomplete(missing)) => {
                body["missing"] = json!(missing);
            }
            _ => {}
        }

        let mut response = (status, Json(body)).into_response();
        response.extensions_mut().insert(ErrorSummary { message });
        response
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Set the Sentry user context from a user ID.
///
/// Call this after successful authentication to associate errors with users.
pub fn set_sentry_user(user_id: &impl ToString, email: Option<&str>) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(user_id.to_string()),
            email: email.map(String::from),
            ..Default::default()
        }));
    });
}

/// Clear the Sentry user context.
pub fn clear_sentry_user() {
    sentry::configure_scope(|scope| {
        scope.set_user(None);
    });
}

/// Add a breadcrumb for a builder action.
pub fn add_breadcrumb(category: &str, message: &str, data: Option<&[(&str, &str)]>) {
    let mut breadcrumb = sentry::Breadcrumb {
        category: Some(category.to_string()),
        message: Some(message.to_string()),
        level: sentry::Level::Info,
        ..Default::default()
    };

    if let Some(pairs) = data {
        for (key, value) in pairs {
            breadcrumb.data.insert(
                (*key).to_string(),
                serde_json::Value::String((*value).to_string()),
            );
        }
    }

    sentry::add_breadcrumb(breadcrumb);
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::body::to_bytes;

    use super::*;

    async fn body_json(err: AppError) -> (StatusCode, serde_json::Value) {
        let response = err.into_response();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[test]
    fn test_app_error_display() {
        let err = AppError::NotFound("storefront 12".to_string());
        assert_eq!(err.to_string(), "Not found: storefront 12");

        let err = AppError::BadRequest("no products selected".to_string());
        assert_eq!(err.to_string(), "Bad request: no products selected");
    }

    #[test]
    fn test_app_error_status_codes() {
        assert_eq!(
            AppError::NotFound("x".to_string()).status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            AppError::Database(RepositoryError::NotFound).status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            AppError::Database(RepositoryError::Conflict("slug".to_string())).status(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            AppError::Database(RepositoryError::Database(sqlx::Error::PoolTimedOut)).status(),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            AppError::Backend(BackendError::RateLimited(30)).status(),
            StatusCode::TOO_MANY_REQUESTS
        );
        assert_eq!(
            AppError::Backend(BackendError::InvalidCredentials).status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            AppError::Palette(PaletteError::NoOpaquePixels).status(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            AppError::Forbidden("x".to_string()).status(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(AppError::RateLimited.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(
            AppError::Auth(AuthError::InvalidCredentials).status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            AppError::Auth(AuthError::InvalidEmail).status(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
    }

    #[tokio::test]
    async fn test_validation_lists_fields() {
        let mut errors = ValidationErrors::default();
        errors.add("name", "is required");
        let (status, body) = body_json(AppError::Validation(errors)).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["fields"][0]["field"], "name");
    }

    #[tokio::test]
    async fn test_missing_columns_are_listed() {
        let err = AppError::CsvImport(CsvImportError::MissingColumns(vec![
            "shipping_price".to_string(),
        ]));
        let (status, body) = body_json(err).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["columns"][0], "shipping_price");
        assert_eq!(body["error"], "missing required columns: shipping_price");
    }

    #[tokio::test]
    async fn test_internal_details_are_hidden() {
        let err = AppError::Database(RepositoryError::DataCorruption(
            "invalid slug in database: --".to_string(),
        ));
        let (status, body) = body_json(err).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "Internal server error");
    }
}
