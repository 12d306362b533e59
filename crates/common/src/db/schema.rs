//! Schema bootstrap
//!
//! Creates the `pdfs`, `summaries` and `logs` tables, the cascading foreign
//! key from summaries to pdfs, supporting indexes and the
//! `trg_update_latest_summary` trigger. Every statement is idempotent so the
//! migration can run on every start.

use super::DbPool;
use crate::errors::{AppError, Result};
use sea_orm::{ConnectionTrait, DatabaseBackend, TransactionTrait};
use tracing::{debug, info};

const POSTGRES: &[&str] = &[
    r#"CREATE TABLE IF NOT EXISTS pdfs (
        id BIGSERIAL PRIMARY KEY,
        filename TEXT NOT NULL UNIQUE,
        file_size BIGINT NOT NULL,
        title TEXT NOT NULL,
        page_count INTEGER NOT NULL,
        summary TEXT NOT NULL DEFAULT '',
        style TEXT NOT NULL DEFAULT '',
        language TEXT NOT NULL DEFAULT '',
        summary_time DOUBLE PRECISION NOT NULL DEFAULT 0,
        summary_version INTEGER NOT NULL DEFAULT 0,
        created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
        updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
    )"#,
    r#"CREATE TABLE IF NOT EXISTS summaries (
        id BIGSERIAL PRIMARY KEY,
        style TEXT NOT NULL,
        content TEXT NOT NULL,
        pdf_id BIGINT NOT NULL,
        language TEXT NOT NULL,
        summary_time DOUBLE PRECISION NOT NULL DEFAULT 0,
        embedding TEXT,
        created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
        updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
    )"#,
    "ALTER TABLE summaries DROP CONSTRAINT IF EXISTS fk_summaries_pdf",
    r#"ALTER TABLE summaries
        ADD CONSTRAINT fk_summaries_pdf
        FOREIGN KEY (pdf_id) REFERENCES pdfs(id)
        ON UPDATE CASCADE ON DELETE CASCADE"#,
    r#"CREATE TABLE IF NOT EXISTS logs (
        id BIGSERIAL PRIMARY KEY,
        method TEXT NOT NULL,
        path TEXT NOT NULL,
        status_code INTEGER NOT NULL,
        ip_address TEXT NOT NULL DEFAULT '',
        user_agent TEXT NOT NULL DEFAULT '',
        request_body TEXT NOT NULL DEFAULT '',
        response_body TEXT NOT NULL DEFAULT '',
        error_message TEXT NOT NULL DEFAULT '',
        duration_ms DOUBLE PRECISION NOT NULL,
        request_headers TEXT NOT NULL DEFAULT '',
        query_params TEXT NOT NULL DEFAULT '',
        pdf_id BIGINT,
        summary_id BIGINT,
        created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
    )"#,
    "CREATE INDEX IF NOT EXISTS idx_pdfs_created_at ON pdfs (created_at)",
    "CREATE INDEX IF NOT EXISTS idx_summaries_pdf_id ON summaries (pdf_id)",
    "CREATE INDEX IF NOT EXISTS idx_logs_method ON logs (method)",
    "CREATE INDEX IF NOT EXISTS idx_logs_path ON logs (path)",
    "CREATE INDEX IF NOT EXISTS idx_logs_status_code ON logs (status_code)",
    "CREATE INDEX IF NOT EXISTS idx_logs_pdf_id ON logs (pdf_id)",
    "CREATE INDEX IF NOT EXISTS idx_logs_summary_id ON logs (summary_id)",
    r#"CREATE OR REPLACE FUNCTION update_latest_summary() RETURNS TRIGGER AS $$
    BEGIN
        UPDATE pdfs
        SET summary = NEW.content,
            style = NEW.style,
            language = NEW.language,
            summary_time = NEW.summary_time,
            summary_version = summary_version + 1,
            updated_at = NOW()
        WHERE id = NEW.pdf_id;
        RETURN NEW;
    END;
    $$ LANGUAGE plpgsql"#,
    "DROP TRIGGER IF EXISTS trg_update_latest_summary ON summaries",
    r#"CREATE TRIGGER trg_update_latest_summary
        AFTER INSERT ON summaries
        FOR EACH ROW EXECUTE FUNCTION update_latest_summary()"#,
];

// Timestamps are TEXT; the trigger copies the summary's created_at so the
// stored format matches what the application writes.
const SQLITE: &[&str] = &[
    r#"CREATE TABLE IF NOT EXISTS pdfs (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        filename TEXT NOT NULL UNIQUE,
        file_size INTEGER NOT NULL,
        title TEXT NOT NULL,
        page_count INTEGER NOT NULL,
        summary TEXT NOT NULL DEFAULT '',
        style TEXT NOT NULL DEFAULT '',
        language TEXT NOT NULL DEFAULT '',
        summary_time REAL NOT NULL DEFAULT 0,
        summary_version INTEGER NOT NULL DEFAULT 0,
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL
    )"#,
    r#"CREATE TABLE IF NOT EXISTS summaries (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        style TEXT NOT NULL,
        content TEXT NOT NULL,
        pdf_id INTEGER NOT NULL REFERENCES pdfs(id) ON UPDATE CASCADE ON DELETE CASCADE,
        language TEXT NOT NULL,
        summary_time REAL NOT NULL DEFAULT 0,
        embedding TEXT,
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL
    )"#,
    r#"CREATE TABLE IF NOT EXISTS logs (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        method TEXT NOT NULL,
        path TEXT NOT NULL,
        status_code INTEGER NOT NULL,
        ip_address TEXT NOT NULL DEFAULT '',
        user_agent TEXT NOT NULL DEFAULT '',
        request_body TEXT NOT NULL DEFAULT '',
        response_body TEXT NOT NULL DEFAULT '',
        error_message TEXT NOT NULL DEFAULT '',
        duration_ms REAL NOT NULL,
        request_headers TEXT NOT NULL DEFAULT '',
        query_params TEXT NOT NULL DEFAULT '',
        pdf_id INTEGER,
        summary_id INTEGER,
        created_at TEXT NOT NULL
    )"#,
    "CREATE INDEX IF NOT EXISTS idx_pdfs_created_at ON pdfs (created_at)",
    "CREATE INDEX IF NOT EXISTS idx_summaries_pdf_id ON summaries (pdf_id)",
    "CREATE INDEX IF NOT EXISTS idx_logs_method ON logs (method)",
    "CREATE INDEX IF NOT EXISTS idx_logs_path ON logs (path)",
    "CREATE INDEX IF NOT EXISTS idx_logs_status_code ON logs (status_code)",
    "CREATE INDEX IF NOT EXISTS idx_logs_pdf_id ON logs (pdf_id)",
    "CREATE INDEX IF NOT EXISTS idx_logs_summary_id ON logs (summary_id)",
    "DROP TRIGGER IF EXISTS trg_update_latest_summary",
    r#"CREATE TRIGGER trg_update_latest_summary
        AFTER INSERT ON summaries
        FOR EACH ROW
    BEGIN
        UPDATE pdfs
        SET summary = NEW.content,
            style = NEW.style,
            language = NEW.language,
            summary_time = NEW.summary_time,
            summary_version = summary_version + 1,
            updated_at = NEW.created_at
        WHERE id = NEW.pdf_id;
    END"#,
];

/// DDL statements for a backend, in execution order
pub fn statements(backend: DatabaseBackend) -> Result<&'static [&'static str]> {
    match backend {
        DatabaseBackend::Postgres => Ok(POSTGRES),
        DatabaseBackend::Sqlite => Ok(SQLITE),
        other => Err(AppError::Database {
            message: "Unsupported database backend".to_string(),
            details: format!("{:?} is not supported, use postgres or sqlite", other),
        }),
    }
}

/// Apply the schema. Safe to run repeatedly.
///
/// All statements share one transaction, so they run on a single pooled
/// connection and either all apply or none do.
pub async fn migrate(db: &DbPool) -> Result<()> {
    let backend = db.backend();
    let statements = statements(backend)?;

    info!(backend = ?backend, statements = statements.len(), "Applying database schema");

    let txn = db.conn().begin().await.map_err(|e| AppError::Database {
        message: "Failed to start schema transaction".to_string(),
        details: e.to_string(),
    })?;

    for (index, sql) in statements.iter().enumerate() {
        debug!(index, "Executing schema statement");
        txn.execute_unprepared(sql)
            .await
            .map_err(|e| AppError::Database {
                message: format!("Schema statement {} failed", index + 1),
                details: e.to_string(),
            })?;
    }

    txn.commit().await.map_err(|e| AppError::Database {
        message: "Failed to commit schema".to_string(),
        details: e.to_string(),
    })?;

    info!("Database schema is up to date");
    Ok(())
}
