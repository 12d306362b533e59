//! Database layer for pdfsum
//!
//! Provides:
//! - SeaORM entity models
//! - Repository pattern for data access
//! - Schema bootstrap (tables, foreign key, latest-summary trigger)
//! - Connection pool management

pub mod models;
mod repository;
pub mod schema;

pub use repository::{
    ListedPdf, ListedSummary, NewPdf, NewRequestLog, NewSummary, PdfFilter, Repository,
    RequestLogSink, SummaryFilter, SummaryStats,
};

use crate::config::DatabaseConfig;
use crate::errors::{AppError, Result};
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseBackend, DatabaseConnection};
use std::time::Duration;
use tracing::info;

/// Database connection pool wrapper
#[derive(Clone)]
pub struct DbPool {
    conn: DatabaseConnection,
}

impl DbPool {
    /// Create a new database pool from configuration
    pub async fn new(config: &DatabaseConfig) -> Result<Self> {
        info!("Connecting to database...");

        let mut opts = ConnectOptions::new(&config.url);
        opts.max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .idle_timeout(Duration::from_secs(config.idle_timeout_secs))
            .sqlx_logging(false);

        let conn = Database::connect(opts).await.map_err(|e| AppError::Database {
            message: "Failed to connect to database".to_string(),
            details: e.to_string(),
        })?;

        info!(backend = ?conn.get_database_backend(), "Database connection established");

        Ok(Self { conn })
    }

    pub fn conn(&self) -> &DatabaseConnection {
        &self.conn
    }

    pub fn backend(&self) -> DatabaseBackend {
        self.conn.get_database_backend()
    }

    /// Ping the database to check connectivity
    pub async fn ping(&self) -> Result<()> {
        self.conn
            .execute_unprepared("SELECT 1")
            .await
            .map_err(|e| AppError::Database {
                message: "Database ping failed".to_string(),
                details: e.to_string(),
            })?;

        Ok(())
    }
}
