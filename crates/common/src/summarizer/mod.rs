//! Client for the external summarization service
//!
//! The service accepts `multipart/form-data` with `file`, `style` and
//! `language` fields on `POST {base_url}/summarize` and answers with a JSON
//! document describing the generated summary.

use crate::config::SummarizerConfig;
use crate::errors::{AppError, Result};
use crate::metrics::record_summarization;
use async_trait::async_trait;
use axum::http::StatusCode;
use reqwest::multipart::{Form, Part};
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

/// One summarization request
#[derive(Debug, Clone)]
pub struct SummarizeInput {
    pub file_name: String,
    pub data: Vec<u8>,
    pub style: String,
    pub language: String,
}

/// Response of the summarization service, passed through to clients
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct SummaryPayload {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub summary: SummaryDetails,
    #[serde(default)]
    pub embedding: Option<Vec<f32>>,
    #[serde(default)]
    pub language: String,
    #[serde(default)]
    pub style: String,
    #[serde(default)]
    pub file_info: FileInfo,
    #[serde(default)]
    pub text_statistics: serde_json::Map<String, serde_json::Value>,
    #[serde(default)]
    pub processing_info: ProcessingInfo,
    #[serde(default)]
    pub status: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct SummaryDetails {
    #[serde(default)]
    pub main_summary: String,
    #[serde(default)]
    pub word_count: u64,
    #[serde(default)]
    pub reading_time: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct FileInfo {
    #[serde(default)]
    pub original_filename: String,
    #[serde(default)]
    pub file_size: u64,
    #[serde(default)]
    pub file_size_mb: f64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ProcessingInfo {
    #[serde(default)]
    pub chunks_processed: u64,
    #[serde(default)]
    pub chunking_used: bool,
    #[serde(default)]
    pub processing_time_seconds: f64,
    #[serde(default)]
    pub embedding_dimensions: u64,
}

/// Trait for summary generation
#[async_trait]
pub trait Summarizer: Send + Sync {
    async fn summarize(&self, input: SummarizeInput) -> Result<SummaryPayload>;

    /// Where requests are sent, for logs
    fn endpoint(&self) -> &str;
}

/// HTTP client for the summarization service
pub struct HttpSummarizer {
    client: reqwest::Client,
    url: String,
}

impl HttpSummarizer {
    pub fn new(config: &SummarizerConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| AppError::server("Failed to create HTTP client", Some(e.to_string())))?;

        Ok(Self {
            client,
            url: format!("{}/summarize", config.base_url.trim_end_matches('/')),
        })
    }

    async fn make_request(&self, input: SummarizeInput) -> Result<SummaryPayload> {
        let file = Part::bytes(input.data)
            .file_name(input.file_name)
            .mime_str("application/pdf")
            .map_err(|e| AppError::server("Failed to create form file", Some(e.to_string())))?;

        let form = Form::new()
            .part("file", file)
            .text("style", input.style)
            .text("language", input.language);

        let response = self
            .client
            .post(&self.url)
            .multipart(form)
            .send()
            .await
            .map_err(|e| AppError::Backend {
                status: StatusCode::INTERNAL_SERVER_ERROR,
                message: "Failed to connect to summarization service".to_string(),
                details: e.to_string(),
            })?;

        let status = response.status();
        if status != reqwest::StatusCode::OK {
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::Backend {
                status: StatusCode::from_u16(status.as_u16())
                    .unwrap_or(StatusCode::BAD_GATEWAY),
                message: "Summarization service error".to_string(),
                details: body,
            });
        }

        let body = response.bytes().await.map_err(|e| AppError::Backend {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: "Failed to read summarization response".to_string(),
            details: e.to_string(),
        })?;

        serde_json::from_slice(&body).map_err(|e| AppError::Parse {
            message: "Failed to parse response".to_string(),
            details: e.to_string(),
        })
    }
}

#[async_trait]
impl Summarizer for HttpSummarizer {
    async fn summarize(&self, input: SummarizeInput) -> Result<SummaryPayload> {
        let start = Instant::now();
        let style = input.style.clone();

        tracing::debug!(url = %self.url, file = %input.file_name, size = input.data.len(), "Calling summarization service");

        let result = self.make_request(input).await;
        record_summarization(start.elapsed().as_secs_f64(), &style, result.is_ok());

        if let Err(ref e) = result {
            tracing::warn!(url = %self.url, error = %e, "Summarization request failed");
        }

        result
    }

    fn endpoint(&self) -> &str {
        &self.url
    }
}
