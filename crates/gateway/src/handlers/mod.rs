//! API handlers module

pub mod health;
pub mod pdfs;
pub mod summaries;
pub mod summarize;

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::Query;
use axum::Json;
use pdfsum_common::errors::{AppError, Result};

/// Path ids that are not positive integers cannot name an existing row
pub fn parse_id(raw: &str, resource: &str) -> Result<i64> {
    raw.trim()
        .parse::<i64>()
        .ok()
        .filter(|id| *id > 0)
        .ok_or_else(|| AppError::not_found(resource))
}

/// Unwrap a JSON body, reporting extractor rejections as `invalid_request`
pub fn json_body<T>(body: std::result::Result<Json<T>, JsonRejection>) -> Result<T> {
    body.map(|Json(value)| value)
        .map_err(|rejection| AppError::invalid_request("Invalid request body", Some(rejection.body_text())))
}

/// Unwrap a query string the same way as [`json_body`]
pub fn query_params<T>(query: std::result::Result<Query<T>, QueryRejection>) -> Result<T> {
    query
        .map(|Query(value)| value)
        .map_err(|rejection| AppError::invalid_request("Invalid query parameters", Some(rejection.body_text())))
}

pub async fn route_not_found() -> AppError {
    AppError::NotFound {
        message: "Route not found".to_string(),
    }
}
