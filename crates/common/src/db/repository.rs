//! Repository pattern for database operations
//!
//! Provides a clean interface for all data access operations
//! with proper error handling and transaction support.

use crate::db::models::*;
use crate::db::DbPool;
use crate::errors::Result;
use crate::pagination::{ListParams, SortOrder};
use async_trait::async_trait;
use chrono::Utc;
use sea_orm::sea_query::{Expr, Func, SimpleExpr};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, LoaderTrait,
    Order, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};

/// A PDF with its summaries, newest first
pub type ListedPdf = (Pdf, Vec<Summary>);

/// A summary with its parent PDF when it could be loaded
pub type ListedSummary = (Summary, Option<Pdf>);

/// Filters for PDF listing
#[derive(Debug, Clone, Default)]
pub struct PdfFilter {
    /// Case-insensitive substring over title and filename
    pub search: Option<String>,
}

/// Filters for summary listing
#[derive(Debug, Clone, Default)]
pub struct SummaryFilter {
    pub pdf_id: Option<i64>,
    pub style: Option<String>,
    pub language: Option<String>,
    /// Case-insensitive substring over content and style
    pub search: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewPdf {
    pub filename: String,
    pub file_size: i64,
    pub title: String,
    pub page_count: i32,
}

#[derive(Debug, Clone)]
pub struct NewSummary {
    pub pdf_id: i64,
    pub style: String,
    pub language: String,
    pub content: String,
    pub summary_time: f64,
    pub embedding: Option<Vec<f32>>,
}

/// One request audit row, captured by value before it is written
#[derive(Debug, Clone, Default)]
pub struct NewRequestLog {
    pub method: String,
    pub path: String,
    pub status_code: u16,
    pub ip_address: String,
    pub user_agent: String,
    pub request_body: String,
    pub response_body: String,
    pub error_message: String,
    pub duration_ms: f64,
    pub request_headers: String,
    pub query_params: String,
    pub pdf_id: Option<i64>,
    pub summary_id: Option<i64>,
}

/// Aggregates over the summaries table
#[derive(Debug, Clone, Default)]
pub struct SummaryStats {
    pub total_summaries: u64,
    pub by_style: Vec<(String, i64)>,
    pub by_language: Vec<(String, i64)>,
    pub avg_summary_time: f64,
    pub total_pdfs: u64,
}

/// Destination for request audit rows
#[async_trait]
pub trait RequestLogSink: Send + Sync {
    async fn record(&self, entry: NewRequestLog) -> Result<()>;
}

/// Repository for data access operations
#[derive(Clone)]
pub struct Repository {
    pool: DbPool,
}

impl Repository {
    /// Create a new repository with the given connection pool
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    fn conn(&self) -> &DatabaseConnection {
        self.pool.conn()
    }

    // ========================================================================
    // Health Check
    // ========================================================================

    /// Ping the database
    pub async fn ping(&self) -> Result<()> {
        self.pool.ping().await
    }

    // ========================================================================
    // PDF Operations
    // ========================================================================

    /// Create a new PDF row; the latest-summary fields start empty
    pub async fn create_pdf(&self, new: NewPdf) -> Result<Pdf> {
        let now = Utc::now();

        let pdf = PdfActiveModel {
            filename: Set(new.filename),
            file_size: Set(new.file_size),
            title: Set(new.title),
            page_count: Set(new.page_count),
            summary: Set(String::new()),
            style: Set(String::new()),
            language: Set(String::new()),
            summary_time: Set(0.0),
            summary_version: Set(0),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
            ..Default::default()
        };

        pdf.insert(self.conn()).await.map_err(Into::into)
    }

    /// Find PDF by ID
    pub async fn find_pdf(&self, id: i64) -> Result<Option<Pdf>> {
        PdfEntity::find_by_id(id)
            .one(self.conn())
            .await
            .map_err(Into::into)
    }

    /// Find PDF by ID together with its summaries
    pub async fn find_pdf_with_summaries(&self, id: i64) -> Result<Option<ListedPdf>> {
        let Some(pdf) = self.find_pdf(id).await? else {
            return Ok(None);
        };

        let mut listed = self.attach_summaries(vec![pdf]).await?;
        Ok(listed.pop())
    }

    /// List PDFs with pagination, search and sorting
    pub async fn list_pdfs(
        &self,
        filter: &PdfFilter,
        params: &ListParams,
    ) -> Result<(Vec<ListedPdf>, u64)> {
        let mut query = PdfEntity::find();

        if let Some(term) = &filter.search {
            let pattern = like_pattern(term);
            query = query.filter(
                Condition::any()
                    .add(lower_like(PdfColumn::Title, &pattern))
                    .add(lower_like(PdfColumn::Filename, &pattern)),
            );
        }

        let paginator = query
            .order_by(pdf_sort_column(params.sort), order(params.order))
            .order_by(PdfColumn::Id, order(params.order))
            .paginate(self.conn(), params.items_per_page);

        let total = paginator.num_items().await?;
        let pdfs = paginator.fetch_page(params.page_index()).await?;

        Ok((self.attach_summaries(pdfs).await?, total))
    }

    async fn attach_summaries(&self, pdfs: Vec<Pdf>) -> Result<Vec<ListedPdf>> {
        let summaries = pdfs
            .load_many(
                SummaryEntity::find()
                    .order_by_desc(SummaryColumn::CreatedAt)
                    .order_by_desc(SummaryColumn::Id),
                self.conn(),
            )
            .await?;

        Ok(pdfs.into_iter().zip(summaries).collect())
    }

    /// Count all PDFs
    pub async fn count_pdfs(&self) -> Result<u64> {
        PdfEntity::find()
            .count(self.conn())
            .await
            .map_err(Into::into)
    }

    /// Delete a PDF and its summaries in one transaction.
    /// Returns false when the PDF did not exist.
    pub async fn delete_pdf(&self, id: i64) -> Result<bool> {
        let txn = self.conn().begin().await?;

        SummaryEntity::delete_many()
            .filter(SummaryColumn::PdfId.eq(id))
            .exec(&txn)
            .await?;

        let result = PdfEntity::delete_by_id(id).exec(&txn).await?;

        txn.commit().await?;

        Ok(result.rows_affected > 0)
    }

    // ========================================================================
    // Summary Operations
    // ========================================================================

    /// Insert a summary. The database trigger mirrors it onto the parent PDF
    /// within the same statement.
    pub async fn create_summary(&self, new: NewSummary) -> Result<Summary> {
        let now = Utc::now();

        let summary = SummaryActiveModel {
            style: Set(new.style),
            content: Set(new.content),
            pdf_id: Set(new.pdf_id),
            language: Set(new.language),
            summary_time: Set(new.summary_time),
            embedding: Set(new.embedding.as_deref().map(format_embedding)),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
            ..Default::default()
        };

        summary.insert(self.conn()).await.map_err(Into::into)
    }

    /// Find summary by ID with its parent PDF
    pub async fn find_summary(&self, id: i64) -> Result<Option<ListedSummary>> {
        SummaryEntity::find_by_id(id)
            .find_also_related(PdfEntity)
            .one(self.conn())
            .await
            .map_err(Into::into)
    }

    /// List summaries with pagination, filters and sorting
    pub async fn list_summaries(
        &self,
        filter: &SummaryFilter,
        params: &ListParams,
    ) -> Result<(Vec<ListedSummary>, u64)> {
        let mut query = SummaryEntity::find();

        if let Some(pdf_id) = filter.pdf_id {
            query = query.filter(SummaryColumn::PdfId.eq(pdf_id));
        }
        if let Some(style) = &filter.style {
            query = query.filter(lower_like(SummaryColumn::Style, &like_pattern(style)));
        }
        if let Some(language) = &filter.language {
            query = query.filter(lower_like(SummaryColumn::Language, &like_pattern(language)));
        }
        if let Some(term) = &filter.search {
            let pattern = like_pattern(term);
            query = query.filter(
                Condition::any()
                    .add(lower_like(SummaryColumn::Content, &pattern))
                    .add(lower_like(SummaryColumn::Style, &pattern)),
            );
        }

        let paginator = query
            .order_by(summary_sort_column(params.sort), order(params.order))
            .order_by(SummaryColumn::Id, order(params.order))
            .paginate(self.conn(), params.items_per_page);

        let total = paginator.num_items().await?;
        let summaries = paginator.fetch_page(params.page_index()).await?;
        let pdfs = summaries.load_one(PdfEntity, self.conn()).await?;

        Ok((summaries.into_iter().zip(pdfs).collect(), total))
    }

    /// Count all summaries
    pub async fn count_summaries(&self) -> Result<u64> {
        SummaryEntity::find()
            .count(self.conn())
            .await
            .map_err(Into::into)
    }

    /// Delete summary by ID
    pub async fn delete_summary(&self, id: i64) -> Result<bool> {
        let result = SummaryEntity::delete_by_id(id).exec(self.conn()).await?;

        Ok(result.rows_affected > 0)
    }

    /// Delete every summary whose id is listed; returns the rows removed
    pub async fn delete_summaries(&self, ids: &[i64]) -> Result<u64> {
        if ids.is_empty() {
            return Ok(0);
        }

        let result = SummaryEntity::delete_many()
            .filter(SummaryColumn::Id.is_in(ids.iter().copied()))
            .exec(self.conn())
            .await?;

        Ok(result.rows_affected)
    }

    /// Aggregate statistics. The queries run concurrently and are not
    /// wrapped in a shared snapshot.
    pub async fn summary_stats(&self) -> Result<SummaryStats> {
        let conn = self.conn();

        let total = SummaryEntity::find().count(conn);
        let by_style = SummaryEntity::find()
            .select_only()
            .column(SummaryColumn::Style)
            .column_as(SummaryColumn::Id.count(), "count")
            .group_by(SummaryColumn::Style)
            .order_by_asc(SummaryColumn::Style)
            .into_tuple::<(String, i64)>()
            .all(conn);
        let by_language = SummaryEntity::find()
            .select_only()
            .column(SummaryColumn::Language)
            .column_as(SummaryColumn::Id.count(), "count")
            .group_by(SummaryColumn::Language)
            .order_by_asc(SummaryColumn::Language)
            .into_tuple::<(String, i64)>()
            .all(conn);
        let avg = SummaryEntity::find()
            .select_only()
            .column_as(
                SimpleExpr::from(Func::avg(Expr::col(SummaryColumn::SummaryTime))),
                "avg_summary_time",
            )
            .into_tuple::<Option<f64>>()
            .one(conn);
        let total_pdfs = PdfEntity::find().count(conn);

        let (total_summaries, by_style, by_language, avg, total_pdfs) =
            futures::try_join!(total, by_style, by_language, avg, total_pdfs)?;

        Ok(SummaryStats {
            total_summaries,
            by_style,
            by_language,
            avg_summary_time: avg.flatten().unwrap_or(0.0),
            total_pdfs,
        })
    }

    // ========================================================================
    // Request Log Operations
    // ========================================================================

    /// Insert one request audit row
    pub async fn insert_request_log(&self, entry: NewRequestLog) -> Result<RequestLog> {
        let log = RequestLogActiveModel {
            method: Set(entry.method),
            path: Set(entry.path),
            status_code: Set(i32::from(entry.status_code)),
            ip_address: Set(entry.ip_address),
            user_agent: Set(entry.user_agent),
            request_body: Set(entry.request_body),
            response_body: Set(entry.response_body),
            error_message: Set(entry.error_message),
            duration_ms: Set(entry.duration_ms),
            request_headers: Set(entry.request_headers),
            query_params: Set(entry.query_params),
            pdf_id: Set(entry.pdf_id),
            summary_id: Set(entry.summary_id),
            created_at: Set(Utc::now().into()),
            ..Default::default()
        };

        log.insert(self.conn()).await.map_err(Into::into)
    }

    /// Recent request logs, newest first
    pub async fn recent_request_logs(&self, limit: u64) -> Result<Vec<RequestLog>> {
        RequestLogEntity::find()
            .order_by_desc(RequestLogColumn::Id)
            .limit(limit)
            .all(self.conn())
            .await
            .map_err(Into::into)
    }
}

#[async_trait]
impl RequestLogSink for Repository {
    async fn record(&self, entry: NewRequestLog) -> Result<()> {
        self.insert_request_log(entry).await.map(|_| ())
    }
}

fn order(order: SortOrder) -> Order {
    match order {
        SortOrder::Asc => Order::Asc,
        SortOrder::Desc => Order::Desc,
    }
}

fn pdf_sort_column(field: &str) -> PdfColumn {
    match field {
        "updated_at" => PdfColumn::UpdatedAt,
        "title" => PdfColumn::Title,
        "file_size" => PdfColumn::FileSize,
        "page_count" => PdfColumn::PageCount,
        _ => PdfColumn::CreatedAt,
    }
}

fn summary_sort_column(field: &str) -> SummaryColumn {
    match field {
        "updated_at" => SummaryColumn::UpdatedAt,
        "style" => SummaryColumn::Style,
        "language" => SummaryColumn::Language,
        "summary_time" => SummaryColumn::SummaryTime,
        _ => SummaryColumn::CreatedAt,
    }
}

fn like_pattern(term: &str) -> String {
    format!("%{}%", term.to_lowercase())
}

/// `LOWER(col) LIKE pattern`, portable across Postgres and SQLite
fn lower_like<C: ColumnTrait>(column: C, pattern: &str) -> SimpleExpr {
    Expr::expr(Func::lower(Expr::col(column))).like(pattern)
}
