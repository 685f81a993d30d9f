//! Listing query-string parsing.

use std::str::FromStr;

use organize_core::category::Category;
use organize_core::config::PaginationConfig;
use organize_core::model::{EntitySearch, ListQuery};

use crate::error::{ServiceError, ServiceResult};

/// Raw `offset`/`limit`/`search`/`filters` query parameters.
#[derive(Debug, Clone, Copy, Default)]
pub struct ListParams<'a> {
    pub offset: Option<&'a str>,
    pub limit: Option<&'a str>,
    pub search: Option<&'a str>,
    pub filters: Option<&'a str>,
}

impl ListParams<'_> {
    /// ## Summary
    /// Validates the parameters and builds a [`ListQuery`].
    ///
    /// Missing or blank `offset`/`limit` fall back to 0 and the configured
    /// default; a limit above the configured maximum is clamped.
    ///
    /// ## Errors
    /// `InvalidQueryParameter` for non-numeric or negative numbers or a window
    /// whose end does not fit in an `i64`, and
    /// `CategoryUnknown` for an unknown filter name.
    pub fn parse(&self, pagination: PaginationConfig) -> ServiceResult<ListQuery> {
        let offset = parse_non_negative("offset", self.offset)?.unwrap_or(0);
        let limit = parse_non_negative("limit", self.limit)?
            .unwrap_or(pagination.default_limit)
            .min(pagination.max_limit);
        if offset.checked_add(limit).is_none() {
            return Err(ServiceError::InvalidQueryParameter {
                name: "offset",
                reason: format!("{offset} plus limit {limit} overflows"),
            });
        }
        let filters = parse_filters(self.filters.unwrap_or_default())?;

        Ok(ListQuery {
            offset,
            limit,
            search: EntitySearch::new(self.search.unwrap_or_default(), filters),
        })
    }
}

fn parse_non_negative(name: &'static str, raw: Option<&str>) -> ServiceResult<Option<i64>> {
    let Some(raw) = raw.map(str::trim).filter(|raw| !raw.is_empty()) else {
        return Ok(None);
    };

    let value = raw
        .parse::<i64>()
        .map_err(|e| ServiceError::InvalidQueryParameter {
            name,
            reason: format!("'{raw}' is not an integer: {e}"),
        })?;

    if value < 0 {
        return Err(ServiceError::InvalidQueryParameter {
            name,
            reason: format!("{value} is negative"),
        });
    }

    Ok(Some(value))
}

/// ## Summary
/// Parses a comma-separated category list. Blank segments are skipped.
///
/// ## Errors
/// `CategoryUnknown` for the first unknown name.
pub fn parse_filters(raw: &str) -> ServiceResult<Vec<Category>> {
    raw.split(',')
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(|name| Category::from_str(name).map_err(ServiceError::from))
        .collect()
}
