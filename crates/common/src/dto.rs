//! Request and response payloads
//!
//! Response types are built from entity models through `From` impls. Nested
//! data is attached only when it was actually loaded.

use crate::db::models::{Pdf, Summary};
use crate::db::{ListedPdf, ListedSummary, SummaryStats};
use crate::pagination::{total_pages, ListParams};
use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use validator::Validate;

/// Paginated list envelope shared by every list endpoint
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListResponse<T> {
    pub data: Vec<T>,
    pub page: u64,
    pub items_per_page: u64,
    pub total_pages: u64,
    pub total_items: u64,
}

impl<T> ListResponse<T> {
    pub fn new(data: Vec<T>, params: &ListParams, total_items: u64) -> Self {
        Self {
            data,
            page: params.page,
            items_per_page: params.items_per_page,
            total_pages: total_pages(total_items, params.items_per_page),
            total_items,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PdfResponse {
    pub id: i64,
    pub filename: String,
    pub file_size: i64,
    pub title: String,
    pub page_count: i32,
    pub summary: String,
    pub style: String,
    pub language: String,
    pub summary_time: f64,
    pub summary_version: i32,
    pub created_at: DateTime<FixedOffset>,
    pub updated_at: DateTime<FixedOffset>,
    pub summaries: Vec<SummaryResponse>,
}

impl From<ListedPdf> for PdfResponse {
    fn from((pdf, summaries): ListedPdf) -> Self {
        Self {
            id: pdf.id,
            filename: pdf.filename,
            file_size: pdf.file_size,
            title: pdf.title,
            page_count: pdf.page_count,
            summary: pdf.summary,
            style: pdf.style,
            language: pdf.language,
            summary_time: pdf.summary_time,
            summary_version: pdf.summary_version,
            created_at: pdf.created_at,
            updated_at: pdf.updated_at,
            summaries: summaries.into_iter().map(SummaryResponse::from).collect(),
        }
    }
}

impl From<Pdf> for PdfResponse {
    fn from(pdf: Pdf) -> Self {
        (pdf, Vec::new()).into()
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SummaryResponse {
    pub id: i64,
    pub style: String,
    pub content: String,
    pub pdf_id: i64,
    pub language: String,
    pub summary_time: f64,
    pub created_at: DateTime<FixedOffset>,
    pub updated_at: DateTime<FixedOffset>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pdf: Option<PdfBasicInfo>,
}

impl From<Summary> for SummaryResponse {
    fn from(summary: Summary) -> Self {
        (summary, None).into()
    }
}

impl From<ListedSummary> for SummaryResponse {
    fn from((summary, pdf): ListedSummary) -> Self {
        Self {
            id: summary.id,
            style: summary.style,
            content: summary.content,
            pdf_id: summary.pdf_id,
            language: summary.language,
            summary_time: summary.summary_time,
            created_at: summary.created_at,
            updated_at: summary.updated_at,
            pdf: pdf.map(PdfBasicInfo::from),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PdfBasicInfo {
    pub id: i64,
    pub title: String,
    pub filename: String,
    pub file_size: i64,
    pub page_count: i32,
}

impl From<Pdf> for PdfBasicInfo {
    fn from(pdf: Pdf) -> Self {
        Self {
            id: pdf.id,
            title: pdf.title,
            filename: pdf.filename,
            file_size: pdf.file_size,
            page_count: pdf.page_count,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CountResponse {
    pub count: u64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Metadata-only PDF creation; the caller has already stored the file
#[derive(Debug, Deserialize, Validate)]
pub struct CreatePdfRequest {
    #[validate(length(min = 1, max = 255))]
    pub filename: String,

    #[validate(range(min = 1))]
    pub file_size: i64,

    #[validate(length(min = 1))]
    pub title: String,

    #[validate(range(min = 1))]
    pub page_count: i32,
}

#[derive(Debug, Deserialize)]
pub struct SummarizeRequest {
    pub style: String,
    pub language: String,
}

pub const MAX_BULK_DELETE: usize = 100;

#[derive(Debug, Deserialize)]
pub struct BulkDeleteRequest {
    pub ids: Vec<i64>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct BulkDeleteResponse {
    pub message: String,
    pub deleted_count: u64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SummaryStatsResponse {
    pub total_summaries: u64,
    pub by_style: BTreeMap<String, i64>,
    pub by_language: BTreeMap<String, i64>,
    pub avg_summary_time: f64,
    pub total_pdfs: u64,
}

impl From<SummaryStats> for SummaryStatsResponse {
    fn from(stats: SummaryStats) -> Self {
        Self {
            total_summaries: stats.total_summaries,
            by_style: stats.by_style.into_iter().collect(),
            by_language: stats.by_language.into_iter().collect(),
            avg_summary_time: stats.avg_summary_time,
            total_pdfs: stats.total_pdfs,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn pdf(id: i64) -> Pdf {
        let now = Utc::now().fixed_offset();
        Pdf {
            id,
            filename: "0b7e.pdf".into(),
            file_size: 2048,
            title: "report".into(),
            page_count: 5,
            summary: "latest".into(),
            style: "short".into(),
            language: "english".into(),
            summary_time: 3.0,
            summary_version: 2,
            created_at: now,
            updated_at: now,
        }
    }

    fn summary(id: i64, pdf_id: i64) -> Summary {
        let now = Utc::now().fixed_offset();
        Summary {
            id,
            style: "short".into(),
            content: "latest".into(),
            pdf_id,
            language: "english".into(),
            summary_time: 3.0,
            embedding: Some("[0.1]".into()),
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_pdf_response_keeps_latest_summary_fields() {
        let response = PdfResponse::from((pdf(7), vec![summary(1, 7)]));
        let json = serde_json::to_value(&response).unwrap();

        assert_eq!(json["summary_version"], 2);
        assert_eq!(json["summary"], "latest");
        assert_eq!(json["summaries"][0]["pdf_id"], 7);
        // embeddings are internal
        assert!(json["summaries"][0].get("embedding").is_none());
        // nested summaries do not repeat the parent
        assert!(json["summaries"][0].get("pdf").is_none());
    }

    #[test]
    fn test_summary_parent_only_when_loaded() {
        let without = serde_json::to_value(SummaryResponse::from(summary(1, 7))).unwrap();
        assert!(without.get("pdf").is_none());

        let with = serde_json::to_value(SummaryResponse::from((summary(1, 7), Some(pdf(7))))).unwrap();
        assert_eq!(with["pdf"]["id"], 7);
        assert_eq!(with["pdf"]["page_count"], 5);
        assert!(with["pdf"].get("summary").is_none());
    }

    #[test]
    fn test_list_envelope_field_names() {
        let params = ListParams {
            page: 2,
            items_per_page: 10,
            ..Default::default()
        };
        let list = ListResponse::new(vec![1, 2, 3], &params, 13);
        let json = serde_json::to_value(&list).unwrap();

        assert_eq!(json["page"], 2);
        assert_eq!(json["itemsPerPage"], 10);
        assert_eq!(json["totalPages"], 2);
        assert_eq!(json["totalItems"], 13);
    }

    #[test]
    fn test_create_request_validation() {
        let valid = CreatePdfRequest {
            filename: "a.pdf".into(),
            file_size: 10,
            title: "A".into(),
            page_count: 1,
        };
        assert!(valid.validate().is_ok());

        let invalid = CreatePdfRequest {
            filename: String::new(),
            file_size: 0,
            title: String::new(),
            page_count: 0,
        };
        let errors = invalid.validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("filename"));
        assert!(fields.contains_key("page_count"));
    }
}
