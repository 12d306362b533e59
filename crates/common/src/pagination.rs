//! List query normalisation
//!
//! Raw query strings are accepted as-is and normalised leniently: values that
//! do not parse fall back to their defaults instead of rejecting the request.

use serde::Deserialize;

pub const DEFAULT_PAGE: u64 = 1;
pub const DEFAULT_ITEMS_PER_PAGE: u64 = 10;
pub const MAX_ITEMS_PER_PAGE: u64 = 100;
pub const DEFAULT_SORT: &str = "created_at";

/// Sortable columns for `GET /pdf`
pub const PDF_SORT_FIELDS: &[&str] = &["created_at", "updated_at", "title", "file_size", "page_count"];

/// Sortable columns for `GET /summaries`
pub const SUMMARY_SORT_FIELDS: &[&str] =
    &["created_at", "updated_at", "style", "language", "summary_time"];

/// Query string shared by the list endpoints
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListQuery {
    pub page: Option<String>,
    #[serde(alias = "itemsPerPage")]
    pub itemsperpage: Option<String>,
    pub sort: Option<String>,
    pub order: Option<String>,
    pub search: Option<String>,
    pub pdf: Option<String>,
    pub style: Option<String>,
    pub language: Option<String>,
}

impl ListQuery {
    /// Trimmed search term, `None` when absent or blank
    pub fn search_term(&self) -> Option<String> {
        non_blank(self.search.as_deref())
    }

    pub fn style_filter(&self) -> Option<String> {
        non_blank(self.style.as_deref())
    }

    pub fn language_filter(&self) -> Option<String> {
        non_blank(self.language.as_deref())
    }

    /// PDF id filter; zero, negative or unparsable means no filter
    pub fn pdf_filter(&self) -> Option<i64> {
        parse_lenient(self.pdf.as_deref()).filter(|id| *id > 0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Asc,
    Desc,
}

impl SortOrder {
    pub fn parse(raw: Option<&str>) -> Self {
        match raw.map(|s| s.trim().to_ascii_lowercase()).as_deref() {
            Some("asc") => SortOrder::Asc,
            _ => SortOrder::Desc,
        }
    }
}

/// Normalised paging and sorting
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListParams {
    pub page: u64,
    pub items_per_page: u64,
    pub sort: &'static str,
    pub order: SortOrder,
}

impl ListParams {
    pub fn from_query(query: &ListQuery, sort_fields: &[&'static str]) -> Self {
        let page = match parse_lenient(query.page.as_deref()) {
            Some(p) if p >= 1 => p as u64,
            _ => DEFAULT_PAGE,
        };

        let items_per_page = match parse_lenient(query.itemsperpage.as_deref()) {
            Some(n) if (1..=MAX_ITEMS_PER_PAGE as i64).contains(&n) => n as u64,
            _ => DEFAULT_ITEMS_PER_PAGE,
        };

        let requested = query.sort.as_deref().map(str::trim).unwrap_or_default();
        let sort = sort_fields
            .iter()
            .copied()
            .find(|field| *field == requested)
            .unwrap_or(DEFAULT_SORT);

        Self {
            page,
            items_per_page,
            sort,
            order: SortOrder::parse(query.order.as_deref()),
        }
    }

    /// Zero-based page index for SeaORM paginators
    pub fn page_index(&self) -> u64 {
        self.page - 1
    }
}

impl Default for ListParams {
    fn default() -> Self {
        Self {
            page: DEFAULT_PAGE,
            items_per_page: DEFAULT_ITEMS_PER_PAGE,
            sort: DEFAULT_SORT,
            order: SortOrder::Desc,
        }
    }
}

/// `ceil(total / per_page)`, zero when there are no items
pub fn total_pages(total: u64, per_page: u64) -> u64 {
    if per_page == 0 {
        return 0;
    }
    total.div_ceil(per_page)
}

fn parse_lenient(raw: Option<&str>) -> Option<i64> {
    raw.and_then(|s| s.trim().parse::<i64>().ok())
}

fn non_blank(raw: Option<&str>) -> Option<String> {
    raw.map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}
