//! SeaORM entity models
//!
//! Database entities for pdfsum

mod pdf;
mod request_log;
mod summary;

pub use pdf::{
    ActiveModel as PdfActiveModel, Column as PdfColumn, Entity as PdfEntity, Model as Pdf,
};

pub use summary::{
    format_embedding, ActiveModel as SummaryActiveModel, Column as SummaryColumn,
    Entity as SummaryEntity, Model as Summary,
};

pub use request_log::{
    ActiveModel as RequestLogActiveModel, Column as RequestLogColumn,
    Entity as RequestLogEntity, Model as RequestLog,
};
