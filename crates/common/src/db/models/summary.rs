//! Summary entity

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "summaries")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,

    #[sea_orm(column_type = "Text")]
    pub style: String,

    #[sea_orm(column_type = "Text")]
    pub content: String,

    pub pdf_id: i64,

    #[sea_orm(column_type = "Text")]
    pub language: String,

    /// Seconds the summarization service spent on this summary
    pub summary_time: f64,

    /// pgvector embedding stored as text for SeaORM compatibility
    #[sea_orm(column_type = "Text", nullable)]
    pub embedding: Option<String>,

    pub created_at: DateTimeWithTimeZone,

    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::pdf::Entity",
        from = "Column::PdfId",
        to = "super::pdf::Column::Id",
        on_delete = "Cascade"
    )]
    Pdf,
}

impl Related<super::pdf::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Pdf.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

/// Render an embedding in pgvector literal format
pub fn format_embedding(values: &[f32]) -> String {
    let parts: Vec<String> = values.iter().map(|v| v.to_string()).collect();
    format!("[{}]", parts.join(","))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_embedding_text_format() {
        assert_eq!(format_embedding(&[0.5, -1.0, 2.25]), "[0.5,-1,2.25]");
        assert_eq!(format_embedding(&[]), "[]");
    }
}
