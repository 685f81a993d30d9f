//! Deterministic cache keys.
//!
//! Keys are compact JSON with a fixed field order. Paged keys nest the
//! `{"User","Function"}` pair first so every entry of one function for one
//! user shares a literal prefix that a pattern scan can match.

use serde::Serialize;

use organize_core::category::Category;
use organize_core::model::{EntitySearch, ListQuery};
use organize_db::cache::escape_glob;

pub const LIST_FUNCTION: &str = "GetAllEntities";
pub const COUNT_FUNCTION: &str = "CountEntities";

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct CacheKey<'a> {
    user: &'a str,
    function: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct ListKey<'a> {
    cache_key: CacheKey<'a>,
    offset: i64,
    limit: i64,
    search: &'a str,
    filters: Vec<&'static str>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct CountKey<'a> {
    cache_key: CacheKey<'a>,
    search: &'a str,
    filters: Vec<&'static str>,
}

fn filter_names(search: &EntitySearch) -> Vec<&'static str> {
    search.filters().iter().map(|c| c.as_str()).collect()
}

/// ## Errors
/// Returns an error if serialization fails.
pub fn list_key(user_id: &str, query: &ListQuery) -> serde_json::Result<String> {
    serde_json::to_string(&ListKey {
        cache_key: CacheKey {
            user: user_id,
            function: LIST_FUNCTION,
        },
        offset: query.offset,
        limit: query.limit,
        search: query.search.search(),
        filters: filter_names(&query.search),
    })
}

/// ## Errors
/// Returns an error if serialization fails.
pub fn count_key(user_id: &str, search: &EntitySearch) -> serde_json::Result<String> {
    serde_json::to_string(&CountKey {
        cache_key: CacheKey {
            user: user_id,
            function: COUNT_FUNCTION,
        },
        search: search.search(),
        filters: filter_names(search),
    })
}

/// Fixed key of the parent-candidate lookup for `category`,
/// e.g. `{"User":"u1","Function":"GetRoomParents"}`.
///
/// ## Errors
/// Returns an error if serialization fails.
pub fn parents_key(user_id: &str, category: Category) -> serde_json::Result<String> {
    serde_json::to_string(&CacheKey {
        user: user_id,
        function: &category.parents_cache_function(),
    })
}

/// Glob matching every paged key of `function` for `user_id`.
///
/// ## Errors
/// Returns an error if serialization fails.
pub fn function_pattern(user_id: &str, function: &str) -> serde_json::Result<String> {
    let prefix = serde_json::to_string(&CacheKey {
        user: user_id,
        function,
    })?;
    Ok(format!("{}*", escape_glob(&format!("{{\"CacheKey\":{prefix},"))))
}

#[cfg(test)]
mod tests {
    use super::*;
    use organize_db::cache::glob_matches;

    fn query(offset: i64, search: &str, filters: &[Category]) -> ListQuery {
        ListQuery {
            offset,
            limit: 20,
            search: EntitySearch::new(search, filters.iter().copied()),
        }
    }

    #[test]
    fn test_list_key_shape() {
        let key = list_key("u1", &query(0, "box", &[Category::Item])).unwrap();
        assert_eq!(
            key,
            r#"{"CacheKey":{"User":"u1","Function":"GetAllEntities"},"Offset":0,"Limit":20,"Search":"box","Filters":["item"]}"#
        );
    }

    #[test]
    fn test_parents_key_shape() {
        assert_eq!(
            parents_key("u1", Category::ShelvingUnit).unwrap(),
            r#"{"User":"u1","Function":"GetShelving_unitParents"}"#
        );
    }

    #[test]
    fn test_equivalent_filters_share_a_key() {
        let a = list_key("u1", &query(0, "", &[Category::Item, Category::Room])).unwrap();
        let b = list_key("u1", &query(0, "", &[Category::Room, Category::Item, Category::Room])).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_parameters_change_the_key() {
        let base = list_key("u1", &query(0, "", &[])).unwrap();
        assert_ne!(base, list_key("u1", &query(20, "", &[])).unwrap());
        assert_ne!(base, list_key("u1", &query(0, "x", &[])).unwrap());
        assert_ne!(base, list_key("u2", &query(0, "", &[])).unwrap());
    }

    #[test]
    fn test_pattern_matches_only_own_function_and_user() {
        let pattern = function_pattern("u1", LIST_FUNCTION).unwrap();
        let own = list_key("u1", &query(40, "drill", &[Category::Item])).unwrap();
        let other_user = list_key("u10", &query(0, "", &[])).unwrap();
        let count = count_key("u1", &EntitySearch::default()).unwrap();

        assert!(glob_matches(&pattern, &own));
        assert!(!glob_matches(&pattern, &other_user));
        assert!(!glob_matches(&pattern, &count));
    }

    #[test]
    fn test_pattern_escapes_user_metacharacters() {
        let pattern = function_pattern("u*", COUNT_FUNCTION).unwrap();
        let own = count_key("u*", &EntitySearch::default()).unwrap();
        let other = count_key("u1", &EntitySearch::default()).unwrap();

        assert!(glob_matches(&pattern, &own));
        assert!(!glob_matches(&pattern, &other));
    }
}
