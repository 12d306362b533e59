//! PDF handlers

use axum::{
    body::Body,
    extract::{multipart::MultipartRejection, rejection::{JsonRejection, QueryRejection}, Multipart, Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use pdfsum_common::{
    config::UploadConfig,
    db::{NewPdf, PdfFilter, SummaryFilter},
    dto::{CountResponse, CreatePdfRequest, ListResponse, MessageResponse, PdfResponse, SummaryResponse},
    errors::{AppError, Result, ResultExt},
    metrics::record_upload,
    pagination::{ListParams, ListQuery, PDF_SORT_FIELDS, SUMMARY_SORT_FIELDS},
    pdf::count_pages,
    storage::generate_blob_name,
    validation::{default_title, validate_file_extension, validate_file_size, validate_title},
};
use tokio_util::io::ReaderStream;
use tracing::{info, warn};
use validator::Validate;

use super::{json_body, parse_id, query_params};
use crate::AppState;

/// List PDFs with their summaries
pub async fn list_pdfs(
    State(state): State<AppState>,
    query: std::result::Result<Query<ListQuery>, QueryRejection>,
) -> Result<Json<ListResponse<PdfResponse>>> {
    let query = query_params(query)?;
    let params = ListParams::from_query(&query, PDF_SORT_FIELDS);
    let filter = PdfFilter {
        search: query.search_term(),
    };

    let (pdfs, total) = state.repo().list_pdfs(&filter, &params).await?;
    let data = pdfs.into_iter().map(PdfResponse::from).collect();

    Ok(Json(ListResponse::new(data, &params, total)))
}

pub async fn count_pdfs(State(state): State<AppState>) -> Result<Json<CountResponse>> {
    let count = state.repo().count_pdfs().await?;
    Ok(Json(CountResponse { count }))
}

/// Create a PDF row for a file the caller has already stored
pub async fn create_pdf(
    State(state): State<AppState>,
    body: std::result::Result<Json<CreatePdfRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<PdfResponse>)> {
    let request = json_body(body)?;
    request
        .validate()
        .map_err(|e| AppError::invalid_request("Invalid request body", Some(e.to_string())))?;
    validate_title(&request.title, &state.config.upload)?;

    let pdf = state
        .repo()
        .create_pdf(NewPdf {
            filename: request.filename,
            file_size: request.file_size,
            title: request.title,
            page_count: request.page_count,
        })
        .await?;

    info!(pdf_id = pdf.id, filename = %pdf.filename, "PDF record created");
    Ok((StatusCode::CREATED, Json(pdf.into())))
}

pub async fn get_pdf(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<PdfResponse>> {
    let id = parse_id(&id, "PDF")?;

    let listed = state
        .repo()
        .find_pdf_with_summaries(id)
        .await?
        .ok_or_else(|| AppError::not_found("PDF"))?;

    Ok(Json(listed.into()))
}

/// Summaries of one PDF, same query contract as `GET /summaries`
pub async fn list_pdf_summaries(
    State(state): State<AppState>,
    Path(id): Path<String>,
    query: std::result::Result<Query<ListQuery>, QueryRejection>,
) -> Result<Json<ListResponse<SummaryResponse>>> {
    let query = query_params(query)?;
    let id = parse_id(&id, "PDF")?;
    let repo = state.repo();

    if repo.find_pdf(id).await?.is_none() {
        return Err(AppError::not_found("PDF"));
    }

    let params = ListParams::from_query(&query, SUMMARY_SORT_FIELDS);
    let filter = SummaryFilter {
        pdf_id: Some(id),
        style: query.style_filter(),
        language: query.language_filter(),
        search: query.search_term(),
    };

    let (summaries, total) = repo.list_summaries(&filter, &params).await?;
    let data = summaries.into_iter().map(SummaryResponse::from).collect();

    Ok(Json(ListResponse::new(data, &params, total)))
}

/// Stream the stored file back to the client
pub async fn download_pdf(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response> {
    let id = parse_id(&id, "PDF")?;

    let pdf = state
        .repo()
        .find_pdf(id)
        .await?
        .ok_or_else(|| AppError::not_found("PDF"))?;

    let reader = state.blobs.open(&pdf.filename).await.map_err(|e| {
        if e.is_not_found() {
            AppError::NotFound {
                message: "PDF file not found on server".to_string(),
            }
        } else {
            AppError::file("Failed to open PDF file", e)
        }
    })?;

    let headers = [
        (header::CONTENT_TYPE, "application/pdf".to_string()),
        (header::CONTENT_DISPOSITION, content_disposition(&format!("{}.pdf", pdf.title))),
    ];

    Ok((headers, Body::from_stream(ReaderStream::new(reader))).into_response())
}

/// Delete the stored file, then the row (summaries cascade)
pub async fn delete_pdf(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>> {
    let id = parse_id(&id, "PDF")?;
    let repo = state.repo();

    let pdf = repo
        .find_pdf(id)
        .await?
        .ok_or_else(|| AppError::not_found("PDF"))?;

    let exists = state
        .blobs
        .exists(&pdf.filename)
        .await
        .map_err(|e| AppError::file("Failed to check file existence", e))?;

    if exists {
        state
            .blobs
            .delete(&pdf.filename)
            .await
            .map_err(|e| AppError::file("Failed to delete file", e))?;
    } else {
        warn!(pdf_id = id, filename = %pdf.filename, "Stored file already missing");
    }

    if !repo.delete_pdf(id).await? {
        return Err(AppError::not_found("PDF"));
    }

    info!(pdf_id = id, "PDF deleted");
    Ok(Json(MessageResponse::new("PDF deleted successfully")))
}

/// Multipart upload: `file` (required) and `title` (optional)
pub async fn upload_pdf(
    State(state): State<AppState>,
    multipart: std::result::Result<Multipart, MultipartRejection>,
) -> Result<(StatusCode, Json<PdfResponse>)> {
    let mut multipart = multipart
        .map_err(|e| AppError::invalid_request("Invalid multipart form", Some(e.body_text())))?;
    let upload = &state.config.upload;

    let mut file: Option<(String, Vec<u8>)> = None;
    let mut title: Option<String> = None;

    while let Some(field) = multipart.next_field().await.map_err(|e| multipart_error(e, upload))? {
        let field_name = field.name().map(str::to_string);
        match field_name.as_deref() {
            Some("file") => {
                let name = field.file_name().unwrap_or_default().to_string();
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| multipart_error(e, upload))?;
                file = Some((name, data.to_vec()));
            }
            Some("title") => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| multipart_error(e, upload))?;
                title = Some(text);
            }
            _ => {}
        }
    }

    let Some((original_name, data)) = file else {
        return Err(AppError::invalid_request("File is required", None));
    };
    let size = data.len() as u64;

    let checks = validate_file_extension(&original_name, upload)
        .and_then(|_| validate_file_size(size, upload))
        .and_then(|_| {
            let title = match title.as_deref().map(str::trim) {
                Some(t) if !t.is_empty() => t.to_string(),
                _ => default_title(&original_name),
            };
            validate_title(&title, upload).map(|_| title)
        });
    let title = match checks {
        Ok(title) => title,
        Err(e) => {
            record_upload(size, false);
            return Err(e);
        }
    };

    let blob_name = generate_blob_name(&original_name);
    state
        .blobs
        .put(&blob_name, data.clone(), "application/pdf")
        .await
        .map_err(|e| {
            record_upload(size, false);
            AppError::file("Failed to save file", e)
        })?;

    let pages = count_in_background(move || count_pages(&data)).await;

    if pages == 0 {
        remove_blob(&state, &blob_name).await;
        record_upload(size, false);
        return Err(AppError::InvalidFile {
            message: "Invalid PDF file or unable to read page count".to_string(),
        });
    }

    let created = state
        .repo()
        .create_pdf(NewPdf {
            filename: blob_name.clone(),
            file_size: size as i64,
            title,
            page_count: i32::try_from(pages).unwrap_or(i32::MAX),
        })
        .await
        .db_context("Failed to create PDF record");

    let pdf = match created {
        Ok(pdf) => pdf,
        Err(e) => {
            remove_blob(&state, &blob_name).await;
            record_upload(size, false);
            return Err(e);
        }
    };

    record_upload(size, true);
    info!(
        pdf_id = pdf.id,
        filename = %pdf.filename,
        pages = pdf.page_count,
        size,
        "PDF uploaded"
    );

    Ok((StatusCode::CREATED, Json(pdf.into())))
}

/// Run a page count off the async runtime. A panic inside the parser counts
/// as an unreadable file.
async fn count_in_background<F>(count: F) -> usize
where
    F: FnOnce() -> usize + Send + 'static,
{
    tokio::task::spawn_blocking(count).await.unwrap_or_else(|e| {
        warn!(error = %e, "Page count task failed");
        0
    })
}

/// Undo a blob write after a later step failed
async fn remove_blob(state: &AppState, name: &str) {
    if let Err(e) = state.blobs.delete(name).await {
        warn!(blob = %name, error = %e, "Failed to remove orphaned blob");
    }
}

fn multipart_error(err: axum::extract::multipart::MultipartError, upload: &UploadConfig) -> AppError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        return validate_file_size(upload.max_file_size.saturating_add(1), upload)
            .err()
            .unwrap_or_else(|| AppError::invalid_request("File too large", None));
    }
    AppError::invalid_request("Invalid multipart form", Some(err.body_text()))
}

/// `attachment` with an ASCII fallback name and the exact UTF-8 name
fn content_disposition(filename: &str) -> String {
    let fallback: String = filename
        .chars()
        .map(|c| match c {
            '"' | '\\' => '_',
            c if c.is_ascii() && !c.is_ascii_control() => c,
            _ => '_',
        })
        .collect();

    format!(
        "attachment; filename=\"{}\"; filename*=UTF-8''{}",
        fallback,
        urlencoding::encode(filename)
    )
}
