//! Listing filters shared by collection endpoints: paging, a safelisted sort
//! and the metadata block returned next to a page of results.

use serde::Serialize;

pub const MAX_PAGE: i64 = 10_000_000;
pub const MAX_PAGE_SIZE: i64 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortColumn {
    Id,
    Name,
    Level,
}

impl SortColumn {
    pub fn as_sql(&self) -> &'static str {
        match self {
            Self::Id => "id",
            Self::Name => "name",
            Self::Level => "level",
        }
    }
}

/// Only values from the safelist ever reach an ORDER BY clause.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sort {
    pub column: SortColumn,
    pub descending: bool,
}

impl Default for Sort {
    fn default() -> Self {
        Self {
            column: SortColumn::Id,
            descending: false,
        }
    }
}

impl Sort {
    /// `"name"` sorts ascending, `"-name"` descending. Anything else is `None`.
    pub fn parse(raw: &str) -> Option<Self> {
        let (descending, key) = match raw.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, raw),
        };
        let column = match key {
            "id" => SortColumn::Id,
            "name" => SortColumn::Name,
            "level" => SortColumn::Level,
            _ => return None,
        };
        Some(Self { column, descending })
    }

    pub fn direction_sql(&self) -> &'static str {
        if self.descending { "DESC" } else { "ASC" }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub page: i64,
    pub page_size: i64,
}

impl Default for Page {
    fn default() -> Self {
        Self {
            page: 1,
            page_size: 20,
        }
    }
}

impl Page {
    pub fn limit(&self) -> i64 {
        self.page_size
    }

    pub fn offset(&self) -> i64 {
        (self.page - 1) * self.page_size
    }
}

fn is_zero(n: &i64) -> bool {
    *n == 0
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Metadata {
    #[serde(skip_serializing_if = "is_zero")]
    pub current_page: i64,
    #[serde(skip_serializing_if = "is_zero")]
    pub page_size: i64,
    #[serde(skip_serializing_if = "is_zero")]
    pub first_page: i64,
    #[serde(skip_serializing_if = "is_zero")]
    pub last_page: i64,
    #[serde(skip_serializing_if = "is_zero")]
    pub total_records: i64,
}

impl Metadata {
    pub fn calculate(total_records: i64, page: Page) -> Self {
        if total_records == 0 {
            return Self::default();
        }
        Self {
            current_page: page.page,
            page_size: page.page_size,
            first_page: 1,
            last_page: (total_records + page.page_size - 1) / page.page_size,
            total_records,
        }
    }
}
