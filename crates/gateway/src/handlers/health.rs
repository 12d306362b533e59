//! Health check handlers

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use pdfsum_common::dto::MessageResponse;
use serde::Serialize;
use tracing::warn;

use crate::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub database: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_pdfs: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_summaries: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Liveness probe
pub async fn ping() -> Json<MessageResponse> {
    Json(MessageResponse::new("pong"))
}

/// Readiness probe: database connectivity plus row counts
pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let repo = state.repo();

    let counts = async {
        repo.ping().await?;
        let pdfs = repo.count_pdfs().await?;
        let summaries = repo.count_summaries().await?;
        Ok::<_, pdfsum_common::AppError>((pdfs, summaries))
    };

    match counts.await {
        Ok((total_pdfs, total_summaries)) => (
            StatusCode::OK,
            Json(HealthResponse {
                status: "healthy".to_string(),
                database: "connected".to_string(),
                total_pdfs: Some(total_pdfs),
                total_summaries: Some(total_summaries),
                version: Some(pdfsum_common::VERSION.to_string()),
                error: None,
            }),
        ),
        Err(e) => {
            warn!(error = %e, "Health check failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(HealthResponse {
                    status: "unhealthy".to_string(),
                    database: "unreachable".to_string(),
                    total_pdfs: None,
                    total_summaries: None,
                    version: None,
                    error: Some(e.to_string()),
                }),
            )
        }
    }
}
