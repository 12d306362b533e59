//! Request audit log entity
//!
//! Write-only: one row per HTTP request. `pdf_id` and `summary_id` are
//! best-effort back references with no foreign key.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "logs")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,

    #[sea_orm(column_type = "Text")]
    pub method: String,

    #[sea_orm(column_type = "Text")]
    pub path: String,

    pub status_code: i32,

    #[sea_orm(column_type = "Text")]
    pub ip_address: String,

    #[sea_orm(column_type = "Text")]
    pub user_agent: String,

    #[sea_orm(column_type = "Text")]
    pub request_body: String,

    #[sea_orm(column_type = "Text")]
    pub response_body: String,

    #[sea_orm(column_type = "Text")]
    pub error_message: String,

    /// Milliseconds
    pub duration_ms: f64,

    /// JSON object of non-sensitive request headers
    #[sea_orm(column_type = "Text")]
    pub request_headers: String,

    #[sea_orm(column_type = "Text")]
    pub query_params: String,

    pub pdf_id: Option<i64>,

    pub summary_id: Option<i64>,

    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
