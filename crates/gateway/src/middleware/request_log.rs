//! Request audit logging
//!
//! Every request produces a console line (ERROR for 5xx, WARN for 4xx,
//! INFO otherwise) and, when a sink is configured, one row in the `logs`
//! table. The row is written from a detached task after the response has
//! been produced: everything it needs is captured by value first, write
//! failures are logged and counted, and a panicking writer is contained.

use axum::{
    body::{Body, Bytes, HttpBody},
    extract::{ConnectInfo, Request, State},
    http::{header, HeaderMap, Method},
    middleware::Next,
    response::{IntoResponse, Response},
};
use futures::FutureExt;
use pdfsum_common::{
    config::RequestLogConfig,
    db::{NewRequestLog, RequestLogSink},
    errors::{AppError, ErrorMessage},
    metrics::{record_request_log_failure, RequestMetrics},
};
use regex_lite::Regex;
use std::collections::BTreeMap;
use std::net::SocketAddr;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, warn};

pub const REQUEST_TOO_LARGE: &str = "[Body too large to log]";
pub const RESPONSE_TOO_LARGE: &str = "[Response too large to log]";
pub const BINARY_BODY: &str = "[Binary body not logged]";
pub const REDACTED: &str = "[REDACTED]";

/// Header names never written to the audit log (matched case-insensitively)
pub const SENSITIVE_HEADERS: &[&str] = &[
    "authorization",
    "cookie",
    "set-cookie",
    "x-api-key",
    "x-auth-token",
];

pub struct RequestLogger {
    log_request_body: bool,
    log_response_body: bool,
    max_body_size: usize,
    patterns: Vec<Regex>,
    sink: Option<Arc<dyn RequestLogSink>>,
}

impl RequestLogger {
    /// Invalid redaction patterns are skipped with a warning.
    pub fn new(config: &RequestLogConfig, sink: Option<Arc<dyn RequestLogSink>>) -> Self {
        let patterns = config
            .sensitive_patterns
            .iter()
            .filter_map(|pattern| match Regex::new(pattern) {
                Ok(re) => Some(re),
                Err(e) => {
                    warn!(pattern = %pattern, error = %e, "Ignoring invalid redaction pattern");
                    None
                }
            })
            .collect();

        Self {
            log_request_body: config.log_request_body,
            log_response_body: config.log_response_body,
            max_body_size: config.max_body_size,
            patterns,
            sink,
        }
    }

    /// Replace every match of every pattern with `[REDACTED]`
    pub fn redact(&self, text: &str) -> String {
        let mut result = text.to_string();
        for pattern in &self.patterns {
            result = pattern.replace_all(&result, REDACTED).into_owned();
        }
        result
    }

    fn render(&self, bytes: &[u8]) -> String {
        match std::str::from_utf8(bytes) {
            Ok(text) => self.redact(text),
            Err(_) => BINARY_BODY.to_string(),
        }
    }
}

pub async fn log_requests(
    State(logger): State<Arc<RequestLogger>>,
    request: Request,
    next: Next,
) -> Response {
    let start = Instant::now();

    // Captured by value before the handler runs
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let query_params = request.uri().query().unwrap_or_default().to_string();
    let ip_address = client_ip(&request);
    let user_agent = header_str(request.headers(), header::USER_AGENT.as_str());
    let request_headers = headers_json(request.headers());
    let metrics = RequestMetrics::start(method.as_str(), &endpoint_label(&path));

    let (request, request_body) = match capture_request_body(&logger, request).await {
        Ok(captured) => captured,
        Err(err) => return err.into_response(),
    };

    let response = next.run(request).await;

    let status = response.status().as_u16();
    let error_message = response
        .extensions()
        .get::<ErrorMessage>()
        .map(|m| m.0.clone())
        .unwrap_or_default();
    let (response, response_body) = capture_response_body(&logger, response).await;

    let duration_ms = start.elapsed().as_secs_f64() * 1000.0;
    metrics.finish(status);

    if status >= 500 {
        error!(method = %method, path = %path, ip = %ip_address, status, duration_ms, "Request failed");
    } else if status >= 400 {
        warn!(method = %method, path = %path, ip = %ip_address, status, duration_ms, "Request rejected");
    } else {
        info!(method = %method, path = %path, ip = %ip_address, status, duration_ms, "Request completed");
    }

    if let Some(sink) = logger.sink.clone() {
        let entry = NewRequestLog {
            method: method.to_string(),
            pdf_id: extract_id(&path, "pdf"),
            summary_id: extract_id(&path, "summaries"),
            path,
            status_code: status,
            ip_address,
            user_agent,
            request_body,
            response_body,
            error_message,
            duration_ms,
            request_headers,
            query_params,
        };
        spawn_write(sink, entry);
    }

    response
}

/// Write one audit row on a detached task. Never joined.
pub fn spawn_write(sink: Arc<dyn RequestLogSink>, entry: NewRequestLog) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let method = entry.method.clone();
        let path = entry.path.clone();

        match AssertUnwindSafe(sink.record(entry)).catch_unwind().await {
            Ok(Ok(())) => debug!(method = %method, path = %path, "Request log saved"),
            Ok(Err(e)) => {
                record_request_log_failure();
                warn!(method = %method, path = %path, error = %e, "Failed to save request log");
            }
            Err(panic) => {
                record_request_log_failure();
                error!(
                    method = %method,
                    path = %path,
                    panic = %panic_message(panic.as_ref()),
                    "Recovered from panic in request log writer"
                );
            }
        }
    })
}

async fn capture_request_body(
    logger: &RequestLogger,
    request: Request,
) -> Result<(Request, String), AppError> {
    let wants_body = [Method::POST, Method::PUT, Method::PATCH].contains(request.method());
    let textual = is_textual(request.headers()) || is_form(request.headers());
    if !logger.log_request_body || !wants_body || !textual {
        return Ok((request, String::new()));
    }

    let length = request
        .headers()
        .get(header::CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<usize>().ok())
        .or_else(|| request.body().size_hint().exact().map(|n| n as usize));

    match length {
        // Streaming body of unknown size is left alone
        None | Some(0) => Ok((request, String::new())),
        Some(len) if len > logger.max_body_size => Ok((request, REQUEST_TOO_LARGE.to_string())),
        Some(_) => {
            let (parts, body) = request.into_parts();
            let bytes = axum::body::to_bytes(body, logger.max_body_size)
                .await
                .map_err(|e| AppError::invalid_request("Failed to read request body", Some(e.to_string())))?;
            let captured = logger.render(&bytes);
            Ok((Request::from_parts(parts, Body::from(bytes)), captured))
        }
    }
}

async fn capture_response_body(logger: &RequestLogger, response: Response) -> (Response, String) {
    if !logger.log_response_body || !is_textual(response.headers()) {
        return (response, String::new());
    }

    let size = response.body().size_hint().exact();
    match size {
        None => (response, String::new()),
        Some(0) => (response, String::new()),
        Some(len) if len as usize > logger.max_body_size => (response, RESPONSE_TOO_LARGE.to_string()),
        Some(_) => {
            let (parts, body) = response.into_parts();
            match axum::body::to_bytes(body, logger.max_body_size).await {
                Ok(bytes) => {
                    let captured = logger.render(&bytes);
                    (Response::from_parts(parts, Body::from(bytes)), captured)
                }
                Err(e) => {
                    warn!(error = %e, "Failed to buffer response body for logging");
                    (Response::from_parts(parts, Body::from(Bytes::new())), String::new())
                }
            }
        }
    }
}

fn is_textual(headers: &HeaderMap) -> bool {
    headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|ct| ct.starts_with("application/json") || ct.starts_with("text/"))
        .unwrap_or(false)
}

fn is_form(headers: &HeaderMap) -> bool {
    headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|ct| ct.starts_with("application/x-www-form-urlencoded"))
        .unwrap_or(false)
}

/// Socket peer address, then `X-Forwarded-For`, then "unknown"
fn client_ip(request: &Request) -> String {
    if let Some(ConnectInfo(addr)) = request.extensions().get::<ConnectInfo<SocketAddr>>() {
        return addr.ip().to_string();
    }

    request
        .headers()
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| "unknown".to_string())
}

fn header_str(headers: &HeaderMap, name: &str) -> String {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string()
}

pub fn is_sensitive_header(name: &str) -> bool {
    SENSITIVE_HEADERS
        .iter()
        .any(|sensitive| sensitive.eq_ignore_ascii_case(name))
}

/// Non-sensitive request headers as a JSON object
pub fn headers_json(headers: &HeaderMap) -> String {
    let visible: BTreeMap<&str, String> = headers
        .iter()
        .filter(|(name, _)| !is_sensitive_header(name.as_str()))
        .map(|(name, value)| (name.as_str(), String::from_utf8_lossy(value.as_bytes()).into_owned()))
        .collect();

    serde_json::to_string(&visible).unwrap_or_default()
}

/// Id following a path segment literally equal to `resource`, e.g.
/// `/pdf/12/download` yields 12 for "pdf"
pub fn extract_id(path: &str, resource: &str) -> Option<i64> {
    let segments: Vec<&str> = path.split('/').collect();
    segments
        .windows(2)
        .find(|pair| pair[0] == resource)
        .and_then(|pair| pair[1].parse::<u32>().ok())
        .filter(|id| *id > 0)
        .map(i64::from)
}

/// Metrics label for a path: numeric segments collapse to `{id}`
pub fn endpoint_label(path: &str) -> String {
    path.split('/')
        .map(|segment| {
            if !segment.is_empty() && segment.bytes().all(|b| b.is_ascii_digit()) {
                "{id}"
            } else {
                segment
            }
        })
        .collect::<Vec<_>>()
        .join("/")
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
