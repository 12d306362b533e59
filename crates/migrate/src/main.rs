//! pdfsum schema migration
//!
//! Creates the tables, the summaries foreign key and the latest-summary
//! trigger, then exits. Safe to run repeatedly.

use anyhow::Context;
use pdfsum_common::{
    config::AppConfig,
    db::{schema, DbPool},
    VERSION,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = AppConfig::load().context("Failed to load configuration")?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.observability.log_level)),
        )
        .with_target(true)
        .init();

    info!("pdfsum migrate v{}", VERSION);

    let db = DbPool::new(&config.database)
        .await
        .context("Failed to connect to database")?;
    schema::migrate(&db).await.context("Migration failed")?;

    info!(backend = ?db.backend(), "Schema is up to date");
    Ok(())
}
