//! Repository tests against a SQLite database with the real schema applied.

use pdfsum_common::config::DatabaseConfig;
use pdfsum_common::db::{schema, NewPdf, NewRequestLog, NewSummary, PdfFilter, SummaryFilter};
use pdfsum_common::pagination::{ListParams, SortOrder};
use pdfsum_common::{DbPool, Repository};
use tempfile::TempDir;
use tokio_test::assert_ok;

async fn setup() -> (TempDir, Repository) {
    let dir = tempfile::tempdir().unwrap();
    let config = DatabaseConfig {
        url: format!("sqlite://{}?mode=rwc", dir.path().join("test.db").display()),
        max_connections: 4,
        min_connections: 1,
        ..Default::default()
    };
    let pool = DbPool::new(&config).await.unwrap();
    schema::migrate(&pool).await.unwrap();
    // idempotent
    schema::migrate(&pool).await.unwrap();
    (dir, Repository::new(pool))
}

fn new_pdf(title: &str) -> NewPdf {
    NewPdf {
        filename: format!("{}.pdf", uuid_like(title)),
        file_size: 1000,
        title: title.to_string(),
        page_count: 3,
    }
}

fn uuid_like(seed: &str) -> String {
    seed.replace(' ', "-").to_lowercase()
}

fn new_summary(pdf_id: i64, style: &str, language: &str, time: f64) -> NewSummary {
    NewSummary {
        pdf_id,
        style: style.to_string(),
        language: language.to_string(),
        content: format!("{} summary", style),
        summary_time: time,
        embedding: Some(vec![0.25, 0.5]),
    }
}

#[tokio::test]
async fn summary_insert_updates_latest_fields() {
    let (_dir, repo) = setup().await;

    let pdf = repo.create_pdf(new_pdf("Annual Report")).await.unwrap();
    assert_eq!(pdf.summary_version, 0);
    assert_eq!(pdf.summary, "");

    repo.create_summary(new_summary(pdf.id, "concise", "en", 1.5))
        .await
        .unwrap();
    let after_first = repo.find_pdf(pdf.id).await.unwrap().unwrap();
    assert_eq!(after_first.summary_version, 1);
    assert_eq!(after_first.style, "concise");
    assert_eq!(after_first.language, "en");
    assert_eq!(after_first.summary, "concise summary");
    assert_eq!(after_first.summary_time, 1.5);

    let second = repo
        .create_summary(new_summary(pdf.id, "detailed", "english", 4.0))
        .await
        .unwrap();
    assert_eq!(second.embedding.as_deref(), Some("[0.25,0.5]"));

    let after_second = repo.find_pdf(pdf.id).await.unwrap().unwrap();
    assert_eq!(after_second.summary_version, 2);
    assert_eq!(after_second.style, "detailed");
    assert_eq!(after_second.summary_time, 4.0);
}

#[tokio::test]
async fn summary_for_missing_pdf_is_rejected() {
    let (_dir, repo) = setup().await;

    let err = repo
        .create_summary(new_summary(999, "short", "en", 1.0))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), "database_error");
}

#[tokio::test]
async fn delete_pdf_cascades_to_summaries() {
    let (_dir, repo) = setup().await;

    let keep = repo.create_pdf(new_pdf("Keep")).await.unwrap();
    let gone = repo.create_pdf(new_pdf("Gone")).await.unwrap();
    repo.create_summary(new_summary(keep.id, "short", "en", 1.0)).await.unwrap();
    repo.create_summary(new_summary(gone.id, "short", "en", 1.0)).await.unwrap();
    repo.create_summary(new_summary(gone.id, "general", "id", 2.0)).await.unwrap();

    assert!(repo.delete_pdf(gone.id).await.unwrap());
    assert!(!repo.delete_pdf(gone.id).await.unwrap());

    assert!(repo.find_pdf(gone.id).await.unwrap().is_none());
    assert_eq!(repo.count_summaries().await.unwrap(), 1);
    assert_eq!(repo.count_pdfs().await.unwrap(), 1);
}

#[tokio::test]
async fn list_pdfs_paginates_searches_and_sorts() {
    let (_dir, repo) = setup().await;

    for title in ["Alpha Report", "beta notes", "Gamma REPORT", "delta", "epsilon"] {
        repo.create_pdf(new_pdf(title)).await.unwrap();
    }

    let params = ListParams {
        page: 1,
        items_per_page: 2,
        sort: "title",
        order: SortOrder::Asc,
    };
    let (page, total) = repo.list_pdfs(&PdfFilter::default(), &params).await.unwrap();
    assert_eq!(total, 5);
    assert_eq!(page.len(), 2);
    assert_eq!(page[0].0.title, "Alpha Report");

    let last = ListParams { page: 3, ..params.clone() };
    let (page, _) = repo.list_pdfs(&PdfFilter::default(), &last).await.unwrap();
    assert_eq!(page.len(), 1);

    let filter = PdfFilter {
        search: Some("report".into()),
    };
    let (page, total) = repo.list_pdfs(&filter, &ListParams::default()).await.unwrap();
    assert_eq!(total, 2);
    assert!(page.iter().all(|(pdf, _)| pdf.title.to_lowercase().contains("report")));
}

#[tokio::test]
async fn list_pdfs_attaches_summaries() {
    let (_dir, repo) = setup().await;

    let pdf = repo.create_pdf(new_pdf("With summaries")).await.unwrap();
    repo.create_pdf(new_pdf("Without")).await.unwrap();
    repo.create_summary(new_summary(pdf.id, "short", "en", 1.0)).await.unwrap();
    repo.create_summary(new_summary(pdf.id, "detailed", "en", 2.0)).await.unwrap();

    let (page, _) = repo
        .list_pdfs(&PdfFilter::default(), &ListParams::default())
        .await
        .unwrap();
    let (_, summaries) = page.iter().find(|(p, _)| p.id == pdf.id).unwrap();
    assert_eq!(summaries.len(), 2);
    let (_, empty) = page.iter().find(|(p, _)| p.id != pdf.id).unwrap();
    assert!(empty.is_empty());

    let (found, summaries) = repo.find_pdf_with_summaries(pdf.id).await.unwrap().unwrap();
    assert_eq!(found.id, pdf.id);
    assert_eq!(summaries.len(), 2);
}

#[tokio::test]
async fn list_summaries_filters() {
    let (_dir, repo) = setup().await;

    let a = repo.create_pdf(new_pdf("A")).await.unwrap();
    let b = repo.create_pdf(new_pdf("B")).await.unwrap();
    repo.create_summary(new_summary(a.id, "short", "english", 1.0)).await.unwrap();
    repo.create_summary(new_summary(a.id, "detailed", "indonesian", 2.0)).await.unwrap();
    repo.create_summary(new_summary(b.id, "short", "en", 3.0)).await.unwrap();

    let by_pdf = SummaryFilter {
        pdf_id: Some(a.id),
        ..Default::default()
    };
    let (rows, total) = repo.list_summaries(&by_pdf, &ListParams::default()).await.unwrap();
    assert_eq!(total, 2);
    assert!(rows.iter().all(|(s, pdf)| s.pdf_id == a.id && pdf.as_ref().map(|p| p.id) == Some(a.id)));

    let by_style = SummaryFilter {
        style: Some("SHORT".into()),
        ..Default::default()
    };
    let (_, total) = repo.list_summaries(&by_style, &ListParams::default()).await.unwrap();
    assert_eq!(total, 2);

    let by_language = SummaryFilter {
        language: Some("en".into()),
        ..Default::default()
    };
    // substring: english and en
    let (_, total) = repo.list_summaries(&by_language, &ListParams::default()).await.unwrap();
    assert_eq!(total, 2);

    let search = SummaryFilter {
        search: Some("detailed".into()),
        ..Default::default()
    };
    let (rows, total) = repo.list_summaries(&search, &ListParams::default()).await.unwrap();
    assert_eq!(total, 1);
    assert_eq!(rows[0].0.style, "detailed");

    let sorted = ListParams {
        sort: "summary_time",
        order: SortOrder::Asc,
        ..Default::default()
    };
    let (rows, _) = repo.list_summaries(&SummaryFilter::default(), &sorted).await.unwrap();
    let times: Vec<f64> = rows.iter().map(|(s, _)| s.summary_time).collect();
    assert_eq!(times, vec![1.0, 2.0, 3.0]);
}

#[tokio::test]
async fn bulk_delete_reports_rows_removed() {
    let (_dir, repo) = setup().await;

    let pdf = repo.create_pdf(new_pdf("Bulk")).await.unwrap();
    let first = repo.create_summary(new_summary(pdf.id, "short", "en", 1.0)).await.unwrap();
    let second = repo.create_summary(new_summary(pdf.id, "short", "en", 1.0)).await.unwrap();

    let deleted = repo
        .delete_summaries(&[first.id, second.id, 4242])
        .await
        .unwrap();
    assert_eq!(deleted, 2);
    assert_eq!(repo.delete_summaries(&[]).await.unwrap(), 0);
    assert!(!repo.delete_summary(first.id).await.unwrap());
}

#[tokio::test]
async fn stats_aggregate_by_style_and_language() {
    let (_dir, repo) = setup().await;

    let empty = repo.summary_stats().await.unwrap();
    assert_eq!(empty.total_summaries, 0);
    assert_eq!(empty.avg_summary_time, 0.0);

    let pdf = repo.create_pdf(new_pdf("Stats")).await.unwrap();
    repo.create_summary(new_summary(pdf.id, "short", "en", 1.0)).await.unwrap();
    repo.create_summary(new_summary(pdf.id, "short", "id", 2.0)).await.unwrap();
    repo.create_summary(new_summary(pdf.id, "detailed", "en", 6.0)).await.unwrap();

    let stats = repo.summary_stats().await.unwrap();
    assert_eq!(stats.total_summaries, 3);
    assert_eq!(stats.total_pdfs, 1);
    assert_eq!(stats.avg_summary_time, 3.0);
    assert_eq!(
        stats.by_style,
        vec![("detailed".to_string(), 1), ("short".to_string(), 2)]
    );
    assert_eq!(stats.by_language, vec![("en".to_string(), 2), ("id".to_string(), 1)]);
}

#[tokio::test]
async fn request_logs_are_written() {
    let (_dir, repo) = setup().await;

    assert_ok!(
        repo.insert_request_log(NewRequestLog {
            method: "GET".into(),
            path: "/pdf/3".into(),
            status_code: 404,
            duration_ms: 1.25,
            pdf_id: Some(3),
            ..Default::default()
        })
        .await
    );

    let logs = repo.recent_request_logs(10).await.unwrap();
    assert_eq!(logs.len(), 1);
    assert_eq!(logs[0].status_code, 404);
    assert_eq!(logs[0].pdf_id, Some(3));
    assert_eq!(logs[0].summary_id, None);
}

#[tokio::test]
async fn migrate_again_after_restart() {
    let dir = tempfile::tempdir().unwrap();
    let config = DatabaseConfig {
        url: format!("sqlite://{}?mode=rwc", dir.path().join("restart.db").display()),
        max_connections: 4,
        min_connections: 2,
        ..Default::default()
    };

    let first = DbPool::new(&config).await.unwrap();
    assert_ok!(schema::migrate(&first).await);
    let repo = Repository::new(first);
    let pdf = repo.create_pdf(new_pdf("Survivor")).await.unwrap();
    drop(repo);

    let second = DbPool::new(&config).await.unwrap();
    assert_ok!(schema::migrate(&second).await);
    assert_ok!(schema::migrate(&second).await);

    let repo = Repository::new(second);
    repo.create_summary(new_summary(pdf.id, "short", "en", 1.0))
        .await
        .unwrap();
    let reloaded = repo.find_pdf(pdf.id).await.unwrap().unwrap();
    assert_eq!(reloaded.summary_version, 1);
}
