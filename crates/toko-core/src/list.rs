//! Paginated list execution shared by every collection.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::error::AppError;
use crate::query::{ListFields, ListQuery};
use crate::traits::RecordStore;

/// A record type that can be listed, searched and sorted.
pub trait ListRecord: Send + Sync {
    /// Searchable and sortable fields of this record type.
    const LIST_FIELDS: ListFields;

    /// Text value of a searchable field.
    fn text_field(&self, field: &str) -> Option<&str>;

    /// Comparable value of a sortable field.
    fn sort_key(&self, field: &str) -> SortKey;
}

/// Comparable value of a record field.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum SortKey {
    Missing,
    Text(String),
    Time(DateTime<Utc>),
}

/// One page of records plus pagination metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PageResult<T> {
    pub page_number: u64,
    pub page_size: u64,
    #[serde(rename = "count")]
    pub total_count: u64,
    pub total_pages: u64,
    pub has_previous_page: bool,
    pub has_next_page: bool,
    #[serde(rename = "data")]
    pub items: Vec<T>,
}

impl<T> PageResult<T> {
    pub fn new(page_number: u64, page_size: u64, total_count: u64, items: Vec<T>) -> Self {
        let total_pages = total_count.div_ceil(page_size);
        Self {
            page_number,
            page_size,
            total_count,
            total_pages,
            has_previous_page: page_number > 1,
            has_next_page: page_number < total_pages,
            items,
        }
    }

    /// Convert the items while keeping the metadata.
    pub fn map<U, F>(self, f: F) -> PageResult<U>
    where
        F: FnMut(T) -> U,
    {
        PageResult {
            page_number: self.page_number,
            page_size: self.page_size,
            total_count: self.total_count,
            total_pages: self.total_pages,
            has_previous_page: self.has_previous_page,
            has_next_page: self.has_next_page,
            items: self.items.into_iter().map(f).collect(),
        }
    }
}

/// Count the matching records, fetch the requested page and package both.
///
/// A page past the end yields no items with consistent metadata. Store
/// errors are returned as-is and no partial page is produced.
pub async fn execute_list<S: RecordStore>(
    store: &S,
    query: &ListQuery,
) -> Result<PageResult<S::Record>, AppError> {
    let total_count = store.count(&query.search).await?;
    let items = store
        .find(&query.search, &query.sort, query.skip(), query.limit())
        .await?;

    tracing::debug!(
        page_number = query.page_number,
        page_size = query.page_size,
        total_count,
        returned = items.len(),
        "Listed records"
    );

    Ok(PageResult::new(
        query.page_number,
        query.page_size,
        total_count,
        items,
    ))
}
