//! Summarization handler
//!
//! Sends the stored PDF to the summarization service and records the result
//! as a new summary. The database trigger then mirrors it onto the PDF.
//! Once the service has answered, the caller always gets its payload: a
//! failure to persist the summary is logged, not returned.

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    Json,
};
use pdfsum_common::{
    db::NewSummary,
    dto::SummarizeRequest,
    errors::{AppError, Result, ResultExt},
    summarizer::{SummarizeInput, SummaryPayload},
    validation::{validate_language, validate_style},
};
use tracing::{error, info};

use super::{json_body, parse_id};
use crate::AppState;

pub async fn summarize_pdf(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: std::result::Result<Json<SummarizeRequest>, JsonRejection>,
) -> Result<Json<SummaryPayload>> {
    let request = json_body(body)?;
    validate_style(&request.style, &state.config.summary)?;
    validate_language(&request.language, &state.config.summary)?;

    let id = parse_id(&id, "PDF")?;
    let repo = state.repo();

    let pdf = repo
        .find_pdf(id)
        .await
        .db_context("Failed to find PDF")?
        .ok_or_else(|| AppError::not_found("PDF"))?;

    let data = state
        .blobs
        .read(&pdf.filename)
        .await
        .map_err(|e| AppError::file("Failed to open PDF file", e))?;

    info!(
        pdf_id = id,
        style = %request.style,
        language = %request.language,
        endpoint = %state.summarizer.endpoint(),
        "Requesting summary"
    );

    let payload = state
        .summarizer
        .summarize(SummarizeInput {
            file_name: pdf.filename.clone(),
            data,
            style: request.style.clone(),
            language: request.language.clone(),
        })
        .await?;

    let new_summary = NewSummary {
        pdf_id: id,
        style: non_empty_or(&payload.style, &request.style),
        language: non_empty_or(&payload.language, &request.language),
        content: payload.summary.main_summary.clone(),
        summary_time: payload.processing_info.processing_time_seconds,
        embedding: payload.embedding.clone(),
    };

    match repo.create_summary(new_summary).await {
        Ok(summary) => info!(pdf_id = id, summary_id = summary.id, "Summary saved"),
        Err(e) => error!(pdf_id = id, error = %e, "Failed to save summary"),
    }

    Ok(Json(payload))
}

/// The service echoes style and language; fall back to what was requested
fn non_empty_or(value: &str, fallback: &str) -> String {
    if value.trim().is_empty() {
        fallback.to_string()
    } else {
        value.to_string()
    }
}
