//! Summary handlers

use axum::{
    extract::{rejection::{JsonRejection, QueryRejection}, Path, Query, State},
    Json,
};
use pdfsum_common::{
    db::SummaryFilter,
    dto::{
        BulkDeleteRequest, BulkDeleteResponse, CountResponse, ListResponse, MessageResponse,
        SummaryResponse, SummaryStatsResponse, MAX_BULK_DELETE,
    },
    errors::{AppError, Result},
    pagination::{ListParams, ListQuery, SUMMARY_SORT_FIELDS},
};
use tracing::info;

use super::{json_body, parse_id, query_params};
use crate::AppState;

pub async fn list_summaries(
    State(state): State<AppState>,
    query: std::result::Result<Query<ListQuery>, QueryRejection>,
) -> Result<Json<ListResponse<SummaryResponse>>> {
    let query = query_params(query)?;
    let params = ListParams::from_query(&query, SUMMARY_SORT_FIELDS);
    let filter = SummaryFilter {
        pdf_id: query.pdf_filter(),
        style: query.style_filter(),
        language: query.language_filter(),
        search: query.search_term(),
    };

    let (summaries, total) = state.repo().list_summaries(&filter, &params).await?;
    let data = summaries.into_iter().map(SummaryResponse::from).collect();

    Ok(Json(ListResponse::new(data, &params, total)))
}

pub async fn count_summaries(State(state): State<AppState>) -> Result<Json<CountResponse>> {
    let count = state.repo().count_summaries().await?;
    Ok(Json(CountResponse { count }))
}

/// Aggregates by style and language
pub async fn summary_stats(State(state): State<AppState>) -> Result<Json<SummaryStatsResponse>> {
    let stats = state.repo().summary_stats().await?;
    Ok(Json(stats.into()))
}

pub async fn get_summary(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<SummaryResponse>> {
    let id = parse_id(&id, "Summary")?;

    let listed = state
        .repo()
        .find_summary(id)
        .await?
        .ok_or_else(|| AppError::not_found("Summary"))?;

    Ok(Json(listed.into()))
}

pub async fn delete_summary(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>> {
    let id = parse_id(&id, "Summary")?;

    if !state.repo().delete_summary(id).await? {
        return Err(AppError::not_found("Summary"));
    }

    info!(summary_id = id, "Summary deleted");
    Ok(Json(MessageResponse::new("Summary deleted successfully")))
}

/// Delete up to `MAX_BULK_DELETE` summaries; unknown ids are skipped
pub async fn bulk_delete_summaries(
    State(state): State<AppState>,
    body: std::result::Result<Json<BulkDeleteRequest>, JsonRejection>,
) -> Result<Json<BulkDeleteResponse>> {
    let request = json_body(body)?;

    if request.ids.is_empty() {
        return Err(AppError::invalid_request("No IDs provided", None));
    }
    if request.ids.len() > MAX_BULK_DELETE {
        return Err(AppError::invalid_request(
            format!("Too many IDs provided (max {})", MAX_BULK_DELETE),
            None,
        ));
    }

    let deleted_count = state.repo().delete_summaries(&request.ids).await?;
    info!(requested = request.ids.len(), deleted_count, "Bulk deleted summaries");

    Ok(Json(BulkDeleteResponse {
        message: format!("Successfully deleted {} summaries", deleted_count),
        deleted_count,
    }))
}
