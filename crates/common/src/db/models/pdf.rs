//! PDF document entity
//!
//! The `summary`, `style`, `language`, `summary_time` and `summary_version`
//! columns mirror the most recently inserted summary. They are maintained by
//! the `trg_update_latest_summary` trigger, never by application code.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "pdfs")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,

    /// Generated blob name, unique across the store
    #[sea_orm(column_type = "Text", unique)]
    pub filename: String,

    pub file_size: i64,

    #[sea_orm(column_type = "Text")]
    pub title: String,

    pub page_count: i32,

    #[sea_orm(column_type = "Text")]
    pub summary: String,

    #[sea_orm(column_type = "Text")]
    pub style: String,

    #[sea_orm(column_type = "Text")]
    pub language: String,

    pub summary_time: f64,

    pub summary_version: i32,

    pub created_at: DateTimeWithTimeZone,

    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::summary::Entity")]
    Summaries,
}

impl Related<super::summary::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Summaries.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
