//! Error types for pdfsum services
//!
//! Provides a single error enum for every handler with:
//! - A stable, machine-readable error kind (`invalid_file`, `not_found`, ...)
//! - HTTP status code mapping
//! - Structured `{error, message, details?}` JSON responses

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias using AppError
pub type Result<T> = std::result::Result<T, AppError>;

/// Application error types
#[derive(Error, Debug)]
pub enum AppError {
    // Request shape errors
    #[error("{message}")]
    InvalidRequest {
        message: String,
        details: Option<String>,
    },

    // Domain validation errors
    #[error("{message}")]
    InvalidFile { message: String },

    #[error("{message}")]
    InvalidTitle { message: String },

    #[error("{message}")]
    InvalidStyle { message: String },

    #[error("{message}")]
    InvalidLanguage { message: String },

    // Resource errors
    #[error("{message}")]
    NotFound { message: String },

    // Storage errors
    #[error("{message}: {details}")]
    Database { message: String, details: String },

    #[error("{message}: {details}")]
    File { message: String, details: String },

    // Summarization service errors
    #[error("{message}: {details}")]
    Backend {
        status: StatusCode,
        message: String,
        details: String,
    },

    #[error("{message}: {details}")]
    Parse { message: String, details: String },

    // Rate limiting
    #[error("Rate limit exceeded")]
    RateLimited,

    // Internal errors
    #[error("{message}")]
    Server {
        message: String,
        details: Option<String>,
    },
}

impl AppError {
    pub fn invalid_request(message: impl Into<String>, details: Option<String>) -> Self {
        AppError::InvalidRequest {
            message: message.into(),
            details,
        }
    }

    /// `not_found("PDF")` renders as "PDF not found"
    pub fn not_found(resource: &str) -> Self {
        AppError::NotFound {
            message: format!("{} not found", resource),
        }
    }

    pub fn file(message: impl Into<String>, err: impl std::fmt::Display) -> Self {
        AppError::File {
            message: message.into(),
            details: err.to_string(),
        }
    }

    pub fn server(message: impl Into<String>, details: Option<String>) -> Self {
        AppError::Server {
            message: message.into(),
            details,
        }
    }

    /// Get the wire error kind for this error
    pub fn kind(&self) -> &'static str {
        match self {
            AppError::InvalidRequest { .. } => "invalid_request",
            AppError::InvalidFile { .. } => "invalid_file",
            AppError::InvalidTitle { .. } => "invalid_title",
            AppError::InvalidStyle { .. } => "invalid_style",
            AppError::InvalidLanguage { .. } => "invalid_language",
            AppError::NotFound { .. } => "not_found",
            AppError::Database { .. } => "database_error",
            AppError::File { .. } => "file_error",
            AppError::Backend { .. } => "backend_error",
            AppError::Parse { .. } => "parse_error",
            AppError::RateLimited => "rate_limited",
            AppError::Server { .. } => "server_error",
        }
    }

    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            // 400 Bad Request
            AppError::InvalidRequest { .. }
            | AppError::InvalidFile { .. }
            | AppError::InvalidTitle { .. }
            | AppError::InvalidStyle { .. }
            | AppError::InvalidLanguage { .. } => StatusCode::BAD_REQUEST,

            // 404 Not Found
            AppError::NotFound { .. } => StatusCode::NOT_FOUND,

            // 429 Too Many Requests
            AppError::RateLimited => StatusCode::TOO_MANY_REQUESTS,

            // Mirrors the summarization service
            AppError::Backend { status, .. } => *status,

            // 500 Internal Server Error
            AppError::Database { .. }
            | AppError::File { .. }
            | AppError::Parse { .. }
            | AppError::Server { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Human-readable message without the details suffix
    pub fn message(&self) -> String {
        match self {
            AppError::InvalidRequest { message, .. }
            | AppError::InvalidFile { message }
            | AppError::InvalidTitle { message }
            | AppError::InvalidStyle { message }
            | AppError::InvalidLanguage { message }
            | AppError::NotFound { message }
            | AppError::Database { message, .. }
            | AppError::File { message, .. }
            | AppError::Backend { message, .. }
            | AppError::Parse { message, .. }
            | AppError::Server { message, .. } => message.clone(),
            AppError::RateLimited => self.to_string(),
        }
    }

    pub fn details(&self) -> Option<String> {
        match self {
            AppError::InvalidRequest { details, .. } | AppError::Server { details, .. } => {
                details.clone()
            }
            AppError::Database { details, .. }
            | AppError::File { details, .. }
            | AppError::Backend { details, .. }
            | AppError::Parse { details, .. } => Some(details.clone()),
            _ => None,
        }
    }

    /// Check if this error should be logged at error level
    pub fn is_server_error(&self) -> bool {
        self.status_code().is_server_error()
    }

    /// Check if this error is a client error
    pub fn is_client_error(&self) -> bool {
        self.status_code().is_client_error()
    }
}

/// Structured error response for API
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

/// Attached to error responses so the request logger can record what went wrong.
#[derive(Debug, Clone)]
pub struct ErrorMessage(pub String);

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let kind = self.kind();
        let message = self.message();
        let details = self.details();

        if self.is_server_error() {
            tracing::error!(
                error = %self,
                kind,
                status = status.as_u16(),
                "Server error"
            );
        } else if self.is_client_error() {
            tracing::warn!(
                error = %self,
                kind,
                status = status.as_u16(),
                "Client error"
            );
        }

        let body = ErrorResponse {
            error: kind.to_string(),
            message,
            details,
        };

        let mut response = (status, Json(body)).into_response();
        response
            .extensions_mut()
            .insert(ErrorMessage(self.to_string()));
        response
    }
}

impl From<sea_orm::DbErr> for AppError {
    fn from(err: sea_orm::DbErr) -> Self {
        AppError::Database {
            message: "Database operation failed".to_string(),
            details: err.to_string(),
        }
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::InvalidRequest {
            message: "Invalid request body".to_string(),
            details: Some(err.to_string()),
        }
    }
}

/// Replaces the generic database message with one naming the failed operation.
pub trait ResultExt<T> {
    fn db_context(self, message: &str) -> Result<T>;
}

impl<T> ResultExt<T> for Result<T> {
    fn db_context(self, message: &str) -> Result<T> {
        self.map_err(|err| match err {
            AppError::Database { details, .. } => AppError::Database {
                message: message.to_string(),
                details,
            },
            other => other,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kind_mapping() {
        let err = AppError::not_found("PDF");
        assert_eq!(err.kind(), "not_found");
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(err.message(), "PDF not found");
    }

    #[test]
    fn test_validation_errors_are_client_errors() {
        let errors = [
            AppError::InvalidFile { message: "bad".into() },
            AppError::InvalidTitle { message: "bad".into() },
            AppError::InvalidStyle { message: "bad".into() },
            AppError::InvalidLanguage { message: "bad".into() },
            AppError::invalid_request("bad", None),
        ];
        for err in errors {
            assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
            assert!(err.is_client_error());
            assert!(!err.is_server_error());
        }
    }

    #[test]
    fn test_backend_error_mirrors_upstream_status() {
        let err = AppError::Backend {
            status: StatusCode::UNPROCESSABLE_ENTITY,
            message: "Summarization service error".into(),
            details: "{\"detail\":\"bad style\"}".into(),
        };
        assert_eq!(err.status_code(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(err.kind(), "backend_error");
        assert_eq!(err.details().as_deref(), Some("{\"detail\":\"bad style\"}"));
    }

    #[test]
    fn test_db_context_rewrites_message() {
        let result: Result<()> = Err(sea_orm::DbErr::Custom("boom".into()).into());
        let err = result.db_context("Failed to count PDFs").unwrap_err();
        assert_eq!(err.kind(), "database_error");
        assert_eq!(err.message(), "Failed to count PDFs");
        assert!(err.details().unwrap().contains("boom"));
    }

    #[test]
    fn test_error_response_omits_empty_details() {
        let body = ErrorResponse {
            error: "not_found".into(),
            message: "PDF not found".into(),
            details: None,
        };
        let json = serde_json::to_value(&body).unwrap();
        assert!(json.get("details").is_none());
    }
}
