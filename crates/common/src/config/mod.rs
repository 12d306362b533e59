//! Configuration management for pdfsum services
//!
//! Supports loading configuration from:
//! - Environment variables (prefixed with APP__)
//! - Configuration files (config/default, config/{APP_ENV}, config/local)
//! - Default values

use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Main application configuration
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct AppConfig {
    /// Server configuration
    #[serde(default)]
    pub server: ServerConfig,

    /// Database configuration
    #[serde(default)]
    pub database: DatabaseConfig,

    /// Blob storage configuration
    #[serde(default)]
    pub storage: StorageConfig,

    /// External summarization service
    #[serde(default)]
    pub summarizer: SummarizerConfig,

    /// Upload validation limits
    #[serde(default)]
    pub upload: UploadConfig,

    /// Accepted summary styles and languages
    #[serde(default)]
    pub summary: SummaryConfig,

    /// Request audit logging
    #[serde(default)]
    pub request_log: RequestLogConfig,

    /// Rate limiting configuration
    #[serde(default)]
    pub rate_limit: RateLimitConfig,

    #[serde(default)]
    pub cors: CorsConfig,

    /// Observability configuration
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    /// Host to bind to
    #[serde(default = "default_host")]
    pub host: String,

    /// Port to listen on
    #[serde(default = "default_port")]
    pub port: u16,

    /// Shutdown timeout in seconds
    #[serde(default = "default_shutdown_timeout")]
    pub shutdown_timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatabaseConfig {
    /// Database URL (postgres:// or sqlite://)
    #[serde(default = "default_database_url")]
    pub url: String,

    /// Maximum number of connections
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    /// Minimum number of connections
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,

    /// Connection timeout in seconds
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,

    /// Idle timeout in seconds
    #[serde(default = "default_idle_timeout")]
    pub idle_timeout_secs: u64,

    /// Apply the schema when the gateway starts
    #[serde(default)]
    pub auto_migrate: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    #[default]
    Local,
    S3,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StorageConfig {
    #[serde(default)]
    pub backend: StorageBackend,

    /// Root directory for the local backend
    #[serde(default = "default_upload_dir")]
    pub upload_dir: String,

    /// Bucket name for the S3 backend
    #[serde(default = "default_bucket")]
    pub bucket: String,

    pub region: Option<String>,

    /// Custom endpoint (MinIO, localstack)
    pub endpoint_url: Option<String>,

    #[serde(default = "default_force_path_style")]
    pub force_path_style: bool,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SummarizerConfig {
    /// Base URL; requests go to `{base_url}/summarize`
    #[serde(default = "default_summarizer_url")]
    pub base_url: String,

    /// Request timeout in seconds
    #[serde(default = "default_summarizer_timeout")]
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct UploadConfig {
    /// Maximum accepted file size in bytes
    #[serde(default = "default_max_file_size")]
    pub max_file_size: u64,

    /// Extensions including the leading dot, compared case-insensitively
    #[serde(default = "default_allowed_extensions")]
    pub allowed_extensions: Vec<String>,

    #[serde(default = "default_max_title_length")]
    pub max_title_length: usize,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SummaryConfig {
    #[serde(default = "default_allowed_styles")]
    pub allowed_styles: Vec<String>,

    #[serde(default = "default_allowed_languages")]
    pub allowed_languages: Vec<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RequestLogConfig {
    /// Persist one row per request to the `logs` table
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    #[serde(default = "default_enabled")]
    pub log_request_body: bool,

    #[serde(default = "default_enabled")]
    pub log_response_body: bool,

    /// Bodies larger than this are replaced with a placeholder
    #[serde(default = "default_max_body_size")]
    pub max_body_size: usize,

    /// Regex patterns whose matches are replaced with `[REDACTED]`
    #[serde(default = "default_sensitive_patterns")]
    pub sensitive_patterns: Vec<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RateLimitConfig {
    /// Requests per second (process wide)
    #[serde(default = "default_rate_limit")]
    pub requests_per_second: u32,

    /// Burst capacity
    #[serde(default = "default_burst")]
    pub burst: u32,

    /// Enable rate limiting
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CorsConfig {
    #[serde(default = "default_allowed_origins")]
    pub allowed_origins: Vec<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ObservabilityConfig {
    /// Log level (debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Enable JSON logging
    #[serde(default = "default_json_logging")]
    pub json_logging: bool,

    /// Metrics port (0 to disable)
    #[serde(default = "default_metrics_port")]
    pub metrics_port: u16,

    /// Service name for tracing
    #[serde(default = "default_service_name")]
    pub service_name: String,
}

// Default value functions
fn default_host() -> String { "0.0.0.0".to_string() }
fn default_port() -> u16 { 8080 }
fn default_shutdown_timeout() -> u64 { 30 }
fn default_database_url() -> String { "postgres://localhost/pdfsum".to_string() }
fn default_max_connections() -> u32 { 20 }
fn default_min_connections() -> u32 { 2 }
fn default_connect_timeout() -> u64 { 10 }
fn default_idle_timeout() -> u64 { 300 }
fn default_upload_dir() -> String { "uploads".to_string() }
fn default_bucket() -> String { "pdfs".to_string() }
fn default_force_path_style() -> bool { true }
fn default_summarizer_url() -> String { "http://127.0.0.1:8000".to_string() }
fn default_summarizer_timeout() -> u64 { 300 }
fn default_max_file_size() -> u64 { 10 * 1024 * 1024 }
fn default_allowed_extensions() -> Vec<String> { vec![".pdf".to_string()] }
fn default_max_title_length() -> usize { 255 }
fn default_allowed_styles() -> Vec<String> {
    ["short", "general", "detailed", "concise"].iter().map(|s| s.to_string()).collect()
}
fn default_allowed_languages() -> Vec<String> {
    ["english", "indonesian", "en", "id"].iter().map(|s| s.to_string()).collect()
}
fn default_max_body_size() -> usize { 10_000 }
fn default_sensitive_patterns() -> Vec<String> {
    vec![
        r#"(?i)"password"\s*:\s*"[^"]*""#.to_string(),
        r#"(?i)"token"\s*:\s*"[^"]*""#.to_string(),
        r#"(?i)"secret"\s*:\s*"[^"]*""#.to_string(),
        r#"(?i)"api_key"\s*:\s*"[^"]*""#.to_string(),
    ]
}
fn default_rate_limit() -> u32 { 50 }
fn default_burst() -> u32 { 100 }
fn default_enabled() -> bool { true }
fn default_allowed_origins() -> Vec<String> { vec!["http://localhost:3000".to_string()] }
fn default_log_level() -> String { "info".to_string() }
fn default_json_logging() -> bool { false }
fn default_metrics_port() -> u16 { 9090 }
fn default_service_name() -> String { "pdfsum".to_string() }

impl AppConfig {
    /// Load configuration from environment and files
    pub fn load() -> Result<Self, ConfigError> {
        let env = std::env::var("APP_ENV").unwrap_or_else(|_| "development".to_string());

        let config = Config::builder()
            // Load base config file
            .add_source(File::with_name("config/default").required(false))
            // Load environment-specific config
            .add_source(File::with_name(&format!("config/{}", env)).required(false))
            // Load local overrides
            .add_source(File::with_name("config/local").required(false))
            // e.g., APP__SERVER__PORT=8081
            .add_source(
                Environment::with_prefix("APP")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("cors.allowed_origins")
                    .with_list_parse_key("upload.allowed_extensions")
                    .with_list_parse_key("summary.allowed_styles")
                    .with_list_parse_key("summary.allowed_languages")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }

    /// Get shutdown timeout as Duration
    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_secs(self.server.shutdown_timeout_secs)
    }

}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            shutdown_timeout_secs: default_shutdown_timeout(),
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: default_database_url(),
            max_connections: default_max_connections(),
            min_connections: default_min_connections(),
            connect_timeout_secs: default_connect_timeout(),
            idle_timeout_secs: default_idle_timeout(),
            auto_migrate: false,
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::Local,
            upload_dir: default_upload_dir(),
            bucket: default_bucket(),
            region: None,
            endpoint_url: None,
            force_path_style: default_force_path_style(),
        }
    }
}

impl Default for SummarizerConfig {
    fn default() -> Self {
        Self {
            base_url: default_summarizer_url(),
            timeout_secs: default_summarizer_timeout(),
        }
    }
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            max_file_size: default_max_file_size(),
            allowed_extensions: default_allowed_extensions(),
            max_title_length: default_max_title_length(),
        }
    }
}

impl Default for SummaryConfig {
    fn default() -> Self {
        Self {
            allowed_styles: default_allowed_styles(),
            allowed_languages: default_allowed_languages(),
        }
    }
}

impl Default for RequestLogConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            log_request_body: default_enabled(),
            log_response_body: default_enabled(),
            max_body_size: default_max_body_size(),
            sensitive_patterns: default_sensitive_patterns(),
        }
    }
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            requests_per_second: default_rate_limit(),
            burst: default_burst(),
            enabled: default_enabled(),
        }
    }
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allowed_origins: default_allowed_origins(),
        }
    }
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            json_logging: default_json_logging(),
            metrics_port: default_metrics_port(),
            service_name: default_service_name(),
        }
    }
}
