//! pdfsum API Gateway
//!
//! HTTP surface for PDF management and AI summaries:
//! - PDF upload, listing, download and deletion
//! - Summarization through the external summarization service
//! - Summary listing, statistics and bulk deletion
//! - Request audit logging, rate limiting, CORS and request ids

pub mod handlers;
pub mod middleware;

use axum::{
    extract::DefaultBodyLimit,
    middleware::from_fn_with_state,
    routing::{delete, get, post},
    Router,
};
use pdfsum_common::{
    config::AppConfig,
    db::{DbPool, Repository, RequestLogSink},
    storage::BlobStore,
    summarizer::Summarizer,
};
use std::sync::Arc;
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};

use crate::middleware::{
    cors::cors_layer,
    rate_limit::{create_rate_limiter, rate_limit_middleware},
    request_log::{log_requests, RequestLogger},
};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub db: DbPool,
    pub blobs: Arc<dyn BlobStore>,
    pub summarizer: Arc<dyn Summarizer>,
}

impl AppState {
    pub fn repo(&self) -> Repository {
        Repository::new(self.db.clone())
    }
}

/// Create the main application router
pub fn create_router(state: AppState) -> Router {
    let config = state.config.clone();

    // Multipart overhead on top of the largest accepted file
    let upload_limit = config.upload.max_file_size as usize + 1024 * 1024;

    let routes = Router::new()
        // Health endpoints
        .route("/health", get(handlers::health::health))
        .route("/ping", get(handlers::health::ping))
        // PDF endpoints
        .route(
            "/pdf",
            get(handlers::pdfs::list_pdfs).post(handlers::pdfs::create_pdf),
        )
        .route("/pdf/count", get(handlers::pdfs::count_pdfs))
        .route(
            "/pdf/upload",
            post(handlers::pdfs::upload_pdf).layer(DefaultBodyLimit::max(upload_limit)),
        )
        .route(
            "/pdf/{id}",
            get(handlers::pdfs::get_pdf).delete(handlers::pdfs::delete_pdf),
        )
        .route("/pdf/{id}/download", get(handlers::pdfs::download_pdf))
        .route("/pdf/{id}/summaries", get(handlers::pdfs::list_pdf_summaries))
        .route("/pdf/{id}/summarize", post(handlers::summarize::summarize_pdf))
        // Summary endpoints
        .route("/summaries", get(handlers::summaries::list_summaries))
        .route("/summaries/count", get(handlers::summaries::count_summaries))
        .route("/summaries/stats", get(handlers::summaries::summary_stats))
        .route("/summaries/bulk", delete(handlers::summaries::bulk_delete_summaries))
        .route(
            "/summaries/{id}",
            get(handlers::summaries::get_summary).delete(handlers::summaries::delete_summary),
        )
        .fallback(handlers::route_not_found)
        .with_state(state.clone());

    let routes = if config.rate_limit.enabled {
        let limiter = create_rate_limiter(config.rate_limit.requests_per_second, config.rate_limit.burst);
        routes.layer(from_fn_with_state(limiter, rate_limit_middleware))
    } else {
        routes
    };

    let sink = config
        .request_log
        .enabled
        .then(|| Arc::new(state.repo()) as Arc<dyn RequestLogSink>);
    let logger = Arc::new(RequestLogger::new(&config.request_log, sink));

    // Request ID propagation
    let request_id = SetRequestIdLayer::x_request_id(MakeRequestUuid);
    let propagate_id = PropagateRequestIdLayer::x_request_id();

    routes
        .layer(from_fn_with_state(logger, log_requests))
        .layer(cors_layer(&config.cors))
        .layer(TraceLayer::new_for_http())
        .layer(propagate_id)
        .layer(request_id)
}
