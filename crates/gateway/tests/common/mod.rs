//! Shared fixtures: SQLite database and local blob store in a temp
//! directory, plus a mock summarization service on an ephemeral port.

#![allow(dead_code)]

use axum::{
    body::Body,
    extract::{Multipart, State},
    http::{header, Request, StatusCode},
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use lopdf::{dictionary, Document, Object, Stream};
use pdfsum_common::{
    config::{AppConfig, DatabaseConfig},
    db::{schema, DbPool},
    storage::LocalBlobStore,
    summarizer::HttpSummarizer,
    Repository,
};
use pdfsum_gateway::{create_router, AppState};
use sea_orm::ConnectionTrait;
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;
use tower::ServiceExt;

pub const BOUNDARY: &str = "pdfsum-test-boundary";

/// Canned failure for the mock summarizer
#[derive(Clone, Default)]
pub struct MockBehaviour {
    pub fail_with: Arc<Mutex<Option<(StatusCode, String)>>>,
}

pub struct TestApp {
    pub dir: TempDir,
    pub router: Router,
    pub db: DbPool,
    pub repo: Repository,
    pub summarizer: MockBehaviour,
}

impl TestApp {
    pub async fn new() -> Self {
        Self::with_config(|_| {}).await
    }

    pub async fn with_config(adjust: impl FnOnce(&mut AppConfig)) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let behaviour = MockBehaviour::default();
        let summarizer_url = spawn_mock_summarizer(behaviour.clone()).await;

        let mut config = AppConfig::default();
        config.database = DatabaseConfig {
            url: format!("sqlite://{}?mode=rwc", dir.path().join("app.db").display()),
            max_connections: 4,
            min_connections: 1,
            ..Default::default()
        };
        config.storage.upload_dir = dir.path().join("uploads").display().to_string();
        config.summarizer.base_url = summarizer_url;
        config.summarizer.timeout_secs = 10;
        config.rate_limit.enabled = false;
        config.request_log.enabled = false;
        adjust(&mut config);

        let db = DbPool::new(&config.database).await.unwrap();
        schema::migrate(&db).await.unwrap();

        let blobs = LocalBlobStore::new(&config.storage.upload_dir).await.unwrap();
        let summarizer = HttpSummarizer::new(&config.summarizer).unwrap();

        let state = AppState {
            config: Arc::new(config),
            db: db.clone(),
            blobs: Arc::new(blobs),
            summarizer: Arc::new(summarizer),
        };

        Self {
            dir,
            router: create_router(state),
            db: db.clone(),
            repo: Repository::new(db),
            summarizer: behaviour,
        }
    }

    /// Make every insert into `table` fail from now on
    pub async fn reject_inserts(&self, table: &str) {
        let sql = format!(
            "CREATE TRIGGER reject_{table} BEFORE INSERT ON {table} \
             BEGIN SELECT RAISE(ABORT, 'disk I/O error'); END"
        );
        self.db.conn().execute_unprepared(&sql).await.unwrap();
    }

    pub fn upload_dir(&self) -> std::path::PathBuf {
        self.dir.path().join("uploads")
    }

    /// Number of files in the upload directory
    pub fn stored_files(&self) -> usize {
        std::fs::read_dir(self.upload_dir())
            .map(|entries| entries.count())
            .unwrap_or(0)
    }

    pub async fn send(&self, request: Request<Body>) -> Response {
        self.router.clone().oneshot(request).await.unwrap()
    }

    pub async fn get(&self, uri: &str) -> (StatusCode, Value) {
        let response = self
            .send(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await;
        into_json(response).await
    }

    pub async fn delete(&self, uri: &str) -> (StatusCode, Value) {
        let response = self
            .send(
                Request::builder()
                    .method("DELETE")
                    .uri(uri)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await;
        into_json(response).await
    }

    pub async fn send_json(&self, method: &str, uri: &str, body: Value) -> (StatusCode, Value) {
        let response = self
            .send(
                Request::builder()
                    .method(method)
                    .uri(uri)
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
            )
            .await;
        into_json(response).await
    }

    pub async fn upload(&self, filename: &str, data: &[u8], title: Option<&str>) -> (StatusCode, Value) {
        let response = self
            .send(
                Request::builder()
                    .method("POST")
                    .uri("/pdf/upload")
                    .header(
                        header::CONTENT_TYPE,
                        format!("multipart/form-data; boundary={}", BOUNDARY),
                    )
                    .body(Body::from(multipart_body(filename, data, title)))
                    .unwrap(),
            )
            .await;
        into_json(response).await
    }
}

pub async fn into_json(response: Response) -> (StatusCode, Value) {
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
    };
    (status, value)
}

/// multipart/form-data with a `file` part and an optional `title` part
pub fn multipart_body(filename: &str, data: &[u8], title: Option<&str>) -> Vec<u8> {
    let mut body = Vec::new();

    if let Some(title) = title {
        body.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"title\"\r\n\r\n{}\r\n",
                BOUNDARY, title
            )
            .as_bytes(),
        );
    }

    body.extend_from_slice(
        format!(
            "--{}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"{}\"\r\nContent-Type: application/pdf\r\n\r\n",
            BOUNDARY, filename
        )
        .as_bytes(),
    );
    body.extend_from_slice(data);
    body.extend_from_slice(format!("\r\n--{}--\r\n", BOUNDARY).as_bytes());
    body
}

/// A minimal valid PDF with `pages` blank pages
pub fn build_pdf(pages: usize) -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let mut kids: Vec<Object> = Vec::new();
    for _ in 0..pages {
        let content_id = doc.add_object(Stream::new(dictionary! {}, b"BT ET".to_vec()));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
        });
        kids.push(page_id.into());
    }

    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => pages as i64,
            "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut buf = Vec::new();
    doc.save_to(&mut buf).unwrap();
    buf
}

async fn spawn_mock_summarizer(behaviour: MockBehaviour) -> String {
    let app = Router::new()
        .route("/summarize", post(mock_summarize))
        .with_state(behaviour);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    format!("http://{}", addr)
}

async fn mock_summarize(State(behaviour): State<MockBehaviour>, mut multipart: Multipart) -> Response {
    let failure = behaviour.fail_with.lock().unwrap().clone();
    if let Some((status, body)) = failure {
        return (status, body).into_response();
    }

    let mut style = String::new();
    let mut language = String::new();
    let mut file_name = String::new();
    let mut file_size = 0usize;

    while let Ok(Some(field)) = multipart.next_field().await {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("style") => style = field.text().await.unwrap_or_default(),
            Some("language") => language = field.text().await.unwrap_or_default(),
            Some("file") => {
                file_name = field.file_name().unwrap_or_default().to_string();
                file_size = field.bytes().await.map(|b| b.len()).unwrap_or_default();
            }
            _ => {}
        }
    }

    Json(json!({
        "title": "report",
        "summary": {
            "main_summary": format!("A {} summary in {}", style, language),
            "word_count": 6,
            "reading_time": "1 min"
        },
        "embedding": [0.1, 0.2, 0.3],
        "language": language,
        "style": style,
        "file_info": {
            "original_filename": file_name,
            "file_size": file_size,
            "file_size_mb": 0.0
        },
        "text_statistics": {"sentences": 1},
        "processing_info": {
            "chunks_processed": 1,
            "chunking_used": false,
            "processing_time_seconds": 1.25,
            "embedding_dimensions": 3
        },
        "status": "success"
    }))
    .into_response()
}
