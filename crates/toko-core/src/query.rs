//! List query construction.
//!
//! Turns the raw `page_number` / `page_size` / `search` / `sort` query
//! parameters of a list endpoint into a validated [`ListQuery`]. Explicitly
//! invalid input is rejected with [`AppError::InvalidQueryParameters`];
//! only *missing* values fall back to defaults.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::AppError;

pub const DEFAULT_PAGE_NUMBER: u64 = 1;
pub const DEFAULT_PAGE_SIZE: u64 = 10;

/// Raw list parameters exactly as they arrive on the query string.
#[derive(Debug, Clone, Default)]
pub struct RawListParams {
    pub page_number: Option<String>,
    pub page_size: Option<String>,
    pub search: Option<String>,
    /// `field:direction`, e.g. `name:desc`.
    pub sort: Option<String>,
}

/// Which fields of a record type can be searched and sorted.
#[derive(Debug, Clone, Copy)]
pub struct ListFields {
    /// Text fields matched by the search term.
    pub search: &'static [&'static str],
    /// Fields accepted in `sort`.
    pub sortable: &'static [&'static str],
    /// Sort field used when `sort` is absent.
    pub default_sort: &'static str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortDirection::Asc => "asc",
            SortDirection::Desc => "desc",
        }
    }

    /// SQL keyword for `ORDER BY`.
    pub fn as_sql(&self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }
}

impl fmt::Display for SortDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for SortDirection {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "asc" => Ok(SortDirection::Asc),
            "desc" => Ok(SortDirection::Desc),
            _ => Err(format!("Unknown sort direction: {}", s)),
        }
    }
}

/// Sort field and direction.
///
/// `field` always comes from [`ListFields::sortable`], so stores may
/// interpolate it into queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortSpec {
    pub field: &'static str,
    pub direction: SortDirection,
}

impl SortSpec {
    pub fn asc(field: &'static str) -> Self {
        Self {
            field,
            direction: SortDirection::Asc,
        }
    }

    pub fn desc(field: &'static str) -> Self {
        Self {
            field,
            direction: SortDirection::Desc,
        }
    }
}

/// Case-insensitive substring match over a fixed set of text fields.
///
/// A predicate without a term matches every record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchPredicate {
    term: Option<String>,
    fields: &'static [&'static str],
}

impl SearchPredicate {
    /// Build a predicate; blank terms produce a match-all predicate.
    pub fn new(term: Option<&str>, fields: &'static [&'static str]) -> Self {
        let term = term
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_string);
        Self { term, fields }
    }

    pub fn match_all(fields: &'static [&'static str]) -> Self {
        Self { term: None, fields }
    }

    pub fn term(&self) -> Option<&str> {
        self.term.as_deref()
    }

    pub fn fields(&self) -> &'static [&'static str] {
        self.fields
    }

    pub fn is_match_all(&self) -> bool {
        self.term.is_none()
    }

    /// Evaluate the predicate against a record, using `lookup` to read
    /// the text value of a field.
    pub fn matches<'a, F>(&self, lookup: F) -> bool
    where
        F: Fn(&str) -> Option<&'a str>,
    {
        let Some(term) = &self.term else {
            return true;
        };
        let needle = term.to_lowercase();
        self.fields.iter().any(|field| {
            lookup(*field).is_some_and(|value| value.to_lowercase().contains(&needle))
        })
    }
}

/// A validated list request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListQuery {
    pub page_number: u64,
    pub page_size: u64,
    pub search: SearchPredicate,
    pub sort: SortSpec,
}

impl ListQuery {
    /// Records to skip before the requested page.
    pub fn skip(&self) -> u64 {
        (self.page_number - 1).saturating_mul(self.page_size)
    }

    pub fn limit(&self) -> u64 {
        self.page_size
    }
}

/// Validate and normalize raw list parameters for a record type.
pub fn build_list_query(params: &RawListParams, fields: &ListFields) -> Result<ListQuery, AppError> {
    let page_number = parse_positive(
        "page_number",
        params.page_number.as_deref(),
        DEFAULT_PAGE_NUMBER,
    )?;
    let page_size = parse_positive("page_size", params.page_size.as_deref(), DEFAULT_PAGE_SIZE)?;
    let sort = parse_sort(params.sort.as_deref(), fields)?;
    let search = SearchPredicate::new(params.search.as_deref(), fields.search);

    Ok(ListQuery {
        page_number,
        page_size,
        search,
        sort,
    })
}

fn parse_positive(name: &str, raw: Option<&str>, default: u64) -> Result<u64, AppError> {
    let raw = match raw.map(str::trim) {
        None | Some("") => return Ok(default),
        Some(raw) => raw,
    };

    let value: i64 = raw.parse().map_err(|_| {
        AppError::InvalidQueryParameters(format!("{name} must be an integer, got '{raw}'"))
    })?;

    if value < 1 {
        return Err(AppError::InvalidQueryParameters(format!(
            "{name} must be a positive integer, got {value}"
        )));
    }

    Ok(value as u64)
}

fn parse_sort(raw: Option<&str>, fields: &ListFields) -> Result<SortSpec, AppError> {
    let raw = match raw.map(str::trim) {
        None | Some("") => return Ok(SortSpec::asc(fields.default_sort)),
        Some(raw) => raw,
    };

    let (field, direction) = raw.split_once(':').unwrap_or((raw, ""));
    let field = field.trim();

    let field = fields
        .sortable
        .iter()
        .copied()
        .find(|candidate| *candidate == field)
        .ok_or_else(|| {
            AppError::InvalidQueryParameters(format!(
                "cannot sort by '{field}', expected one of: {}",
                fields.sortable.join(", ")
            ))
        })?;

    // A field without a direction sorts ascending.
    let direction = match direction.trim() {
        "" => SortDirection::Asc,
        dir => dir
            .parse::<SortDirection>()
            .map_err(AppError::InvalidQueryParameters)?,
    };

    Ok(SortSpec { field, direction })
}
