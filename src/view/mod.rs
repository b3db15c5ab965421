use std::cmp::Ordering;

use serde::Serialize;

use crate::api::UserRecord;

pub const DEFAULT_PAGE_SIZE: usize = 10;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SortField {
    Id,
    Name,
    Email,
    CreatedAt,
}

impl SortField {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "id" => Some(Self::Id),
            "name" => Some(Self::Name),
            "email" => Some(Self::Email),
            "created" | "created_at" | "createdat" => Some(Self::CreatedAt),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Id => "id",
            Self::Name => "name",
            Self::Email => "email",
            Self::CreatedAt => "created",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SortOrder {
    Ascending,
    Descending,
}

impl SortOrder {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "asc" | "ascending" => Some(Self::Ascending),
            "desc" | "descending" => Some(Self::Descending),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ascending => "asc",
            Self::Descending => "desc",
        }
    }

    pub fn flipped(&self) -> Self {
        match self {
            Self::Ascending => Self::Descending,
            Self::Descending => Self::Ascending,
        }
    }
}

/// The current search/sort/page selection. Owned by the UI layer; the
/// pipeline never mutates it.
#[derive(Clone, Debug)]
pub struct ViewParams {
    pub search: String,
    pub sort_field: SortField,
    pub sort_order: SortOrder,
    pub page: usize,
    pub page_size: usize,
}

impl Default for ViewParams {
    fn default() -> Self {
        Self {
            search: String::new(),
            sort_field: SortField::CreatedAt,
            sort_order: SortOrder::Descending,
            page: 1,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl ViewParams {
    /// Changing the filter invalidates prior page positions.
    pub fn set_search(&mut self, term: &str) {
        self.search = term.trim().to_string();
        self.page = 1;
    }

    /// Selecting the active field flips the order; a new field starts
    /// ascending. Either way the page resets.
    pub fn toggle_sort(&mut self, field: SortField) {
        if self.sort_field == field {
            self.sort_order = self.sort_order.flipped();
        } else {
            self.sort_field = field;
            self.sort_order = SortOrder::Ascending;
        }
        self.page = 1;
    }

    /// Pulls the page back into `1..=total_pages` after the record set
    /// shrinks underneath it. An empty result keeps page 1.
    pub fn clamp_page(&mut self, total_pages: usize) {
        let max = total_pages.max(1);
        if self.page > max {
            self.page = max;
        }
        if self.page == 0 {
            self.page = 1;
        }
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct Projection {
    pub visible: Vec<UserRecord>,
    pub total_filtered: usize,
    pub total_pages: usize,
}

/// Sort, filter, paginate. Pure and deterministic: identical inputs give
/// identical output, and `params` is never written back. A `page` beyond
/// `total_pages` yields an empty slice; clamping is the caller's job.
pub fn project(records: &[UserRecord], params: &ViewParams) -> Projection {
    let mut sorted: Vec<UserRecord> = records.to_vec();
    sorted.sort_by(|a, b| {
        let ord = compare_by_field(a, b, params.sort_field);
        match params.sort_order {
            SortOrder::Ascending => ord,
            SortOrder::Descending => ord.reverse(),
        }
    });

    let term = params.search.to_lowercase();
    let filtered: Vec<UserRecord> = sorted
        .into_iter()
        .filter(|r| matches_search(r, &term))
        .collect();

    let total_filtered = filtered.len();
    let page_size = params.page_size.max(1);
    let total_pages = (total_filtered + page_size - 1) / page_size;

    let start = params.page.saturating_sub(1).saturating_mul(page_size);
    let visible = if start >= filtered.len() {
        Vec::new()
    } else {
        let end = (start + page_size).min(filtered.len());
        filtered[start..end].to_vec()
    };

    Projection {
        visible,
        total_filtered,
        total_pages,
    }
}

fn compare_by_field(a: &UserRecord, b: &UserRecord, field: SortField) -> Ordering {
    match field {
        SortField::Id => a.id.cmp(&b.id),
        SortField::Name => a.name.to_lowercase().cmp(&b.name.to_lowercase()),
        SortField::Email => a.email.to_lowercase().cmp(&b.email.to_lowercase()),
        SortField::CreatedAt => a.created_at.cmp(&b.created_at),
    }
}

fn matches_search(record: &UserRecord, lowered_term: &str) -> bool {
    if lowered_term.is_empty() {
        return true;
    }
    record.name.to_lowercase().contains(lowered_term)
        || record.email.to_lowercase().contains(lowered_term)
}
