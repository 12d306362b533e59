//! pdfsum Common Library
//!
//! Shared code for the pdfsum services including:
//! - Database models, schema and repository
//! - Blob storage (local disk or S3)
//! - Summarization service client
//! - Error types and handling
//! - Configuration management
//! - Validation, pagination and response payloads
//! - Metrics and observability

pub mod config;
pub mod db;
pub mod dto;
pub mod errors;
pub mod metrics;
pub mod pagination;
pub mod pdf;
pub mod storage;
pub mod summarizer;
pub mod validation;

// Re-export commonly used types
pub use config::AppConfig;
pub use db::{DbPool, Repository};
pub use errors::{AppError, Result};
pub use storage::BlobStore;
pub use summarizer::Summarizer;

/// Application version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
