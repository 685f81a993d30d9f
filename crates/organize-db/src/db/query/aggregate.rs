//! Category-tagged `UNION ALL` queries spanning several category tables.
//!
//! ## Summary
//! Every sub-select is scoped to the owning user and to live rows. Ordering is
//! always category depth descending (buildings first) then id ascending, so
//! a global `LIMIT`/`OFFSET` window is stable across pages.

use diesel_async::{AsyncPgConnection, RunQueryDsl};

use organize_core::category::Category;
use organize_core::model::{EntitySearch, ListQuery, ParentRef};

use super::builder::{BindValue, SqlBuilder};
use crate::model::row::{LabelRow, SummaryRow, TotalRow};

fn summary_columns(category: Category) -> String {
    let location = if category.is_root() {
        "address, NULL::bigint AS parent_id, NULL::text AS parent_category"
    } else {
        "NULL::text AS address, parent_id, parent_category"
    };
    format!(
        "'{name}'::text AS category, {depth} AS depth, id, name, notes, {location}",
        name = category.as_str(),
        depth = category.depth(),
    )
}

fn search_predicate(category: Category, pattern_param: &str) -> String {
    let mut predicate = format!(
        "LOWER(name) LIKE {pattern_param} OR LOWER(COALESCE(notes, '')) LIKE {pattern_param}"
    );
    if category.is_root() {
        predicate.push_str(&format!(
            " OR LOWER(COALESCE(address, '')) LIKE {pattern_param}"
        ));
    }
    format!(" AND ({predicate})")
}

/// Appends one live, user-scoped sub-select per category joined by `glue`.
fn push_per_category(
    builder: &mut SqlBuilder,
    categories: &[Category],
    glue: &str,
    select: impl Fn(Category) -> String,
) {
    let parts: Vec<String> = categories.iter().map(|c| select(*c)).collect();
    builder.push(&parts.join(glue));
}

/// ## Summary
/// Builds the paginated listing over `query.search.categories()`.
#[must_use]
pub fn list_summaries_sql(user_id: &str, query: &ListQuery) -> SqlBuilder {
    let mut builder = SqlBuilder::new();
    let user_param = builder.bind(BindValue::Text(user_id.to_string()));
    let pattern_param = query
        .search
        .like_pattern()
        .map(|pattern| builder.bind(BindValue::Text(pattern)));
    let limit_param = builder.bind(BindValue::BigInt(query.limit));
    let offset_param = builder.bind(BindValue::BigInt(query.offset));

    builder.push("SELECT * FROM (");
    push_per_category(&mut builder, &query.search.categories(), " UNION ALL ", |c| {
        let search = pattern_param
            .as_deref()
            .map(|p| search_predicate(c, p))
            .unwrap_or_default();
        format!(
            "(SELECT {columns} FROM {table} \
             WHERE user_id = {user_param} AND deleted_at IS NULL{search})",
            columns = summary_columns(c),
            table = c.table_name(),
        )
    });
    builder.push(&format!(
        ") AS entities ORDER BY depth DESC, id ASC LIMIT {limit_param} OFFSET {offset_param}"
    ));

    builder
}

/// ## Summary
/// Builds the single-statement total over `search.categories()`.
#[must_use]
pub fn count_matching_sql(user_id: &str, search: &EntitySearch) -> SqlBuilder {
    let mut builder = SqlBuilder::new();
    let user_param = builder.bind(BindValue::Text(user_id.to_string()));
    let pattern_param = search
        .like_pattern()
        .map(|pattern| builder.bind(BindValue::Text(pattern)));

    builder.push("SELECT ");
    push_per_category(&mut builder, &search.categories(), " + ", |c| {
        let search = pattern_param
            .as_deref()
            .map(|p| search_predicate(c, p))
            .unwrap_or_default();
        format!(
            "(SELECT COUNT(*) FROM {table} \
             WHERE user_id = {user_param} AND deleted_at IS NULL{search})",
            table = c.table_name(),
        )
    });
    builder.push(" AS total");

    builder
}

/// ## Summary
/// Builds the live-children total of `parent` across `child_categories`.
#[must_use]
pub fn count_children_sql(
    user_id: &str,
    parent: ParentRef,
    child_categories: &[Category],
) -> SqlBuilder {
    let mut builder = SqlBuilder::new();
    let user_param = builder.bind(BindValue::Text(user_id.to_string()));
    let id_param = builder.bind(BindValue::BigInt(parent.id));
    let category_param = builder.bind(BindValue::Text(parent.category.as_str().to_string()));

    builder.push("SELECT ");
    push_per_category(&mut builder, child_categories, " + ", |c| {
        format!(
            "(SELECT COUNT(*) FROM {table} \
             WHERE user_id = {user_param} AND parent_id = {id_param} \
             AND parent_category = {category_param} AND deleted_at IS NULL)",
            table = c.table_name(),
        )
    });
    builder.push(" AS total");

    builder
}

/// ## Summary
/// Builds the `{id, name, category}` listing of every live entity in
/// `categories`.
#[must_use]
pub fn list_labels_sql(user_id: &str, categories: &[Category]) -> SqlBuilder {
    let mut builder = SqlBuilder::new();
    let user_param = builder.bind(BindValue::Text(user_id.to_string()));

    builder.push("SELECT * FROM (");
    push_per_category(&mut builder, categories, " UNION ALL ", |c| {
        format!(
            "(SELECT '{name}'::text AS category, {depth} AS depth, id, name FROM {table} \
             WHERE user_id = {user_param} AND deleted_at IS NULL)",
            name = c.as_str(),
            depth = c.depth(),
            table = c.table_name(),
        )
    });
    builder.push(") AS candidates ORDER BY depth DESC, id ASC");

    builder
}

/// ## Summary
/// Builds the direct live children of `parent` across `child_categories`.
#[must_use]
pub fn list_children_sql(
    user_id: &str,
    parent: ParentRef,
    child_categories: &[Category],
) -> SqlBuilder {
    let mut builder = SqlBuilder::new();
    let user_param = builder.bind(BindValue::Text(user_id.to_string()));
    let id_param = builder.bind(BindValue::BigInt(parent.id));
    let category_param = builder.bind(BindValue::Text(parent.category.as_str().to_string()));

    builder.push("SELECT * FROM (");
    push_per_category(&mut builder, child_categories, " UNION ALL ", |c| {
        format!(
            "(SELECT {columns} FROM {table} \
             WHERE user_id = {user_param} AND parent_id = {id_param} \
             AND parent_category = {category_param} AND deleted_at IS NULL)",
            columns = summary_columns(c),
            table = c.table_name(),
        )
    });
    builder.push(") AS children ORDER BY depth DESC, id ASC");

    builder
}

/// ## Errors
/// Returns database errors if the query fails.
pub async fn list_summaries(
    conn: &mut AsyncPgConnection,
    user_id: &str,
    query: &ListQuery,
) -> diesel::QueryResult<Vec<SummaryRow>> {
    list_summaries_sql(user_id, query).into_query().load(conn).await
}

/// ## Errors
/// Returns database errors if the query fails.
pub async fn count_matching(
    conn: &mut AsyncPgConnection,
    user_id: &str,
    search: &EntitySearch,
) -> diesel::QueryResult<i64> {
    let row: TotalRow = count_matching_sql(user_id, search)
        .into_query()
        .get_result(conn)
        .await?;
    Ok(row.total)
}

/// ## Summary
/// Counts live children of `parent`. Returns `0` without querying when
/// `child_categories` is empty.
///
/// ## Errors
/// Returns database errors if the query fails.
pub async fn count_children(
    conn: &mut AsyncPgConnection,
    user_id: &str,
    parent: ParentRef,
    child_categories: &[Category],
) -> diesel::QueryResult<i64> {
    if child_categories.is_empty() {
        return Ok(0);
    }
    let row: TotalRow = count_children_sql(user_id, parent, child_categories)
        .into_query()
        .get_result(conn)
        .await?;
    Ok(row.total)
}

/// ## Errors
/// Returns database errors if the query fails.
pub async fn list_labels(
    conn: &mut AsyncPgConnection,
    user_id: &str,
    categories: &[Category],
) -> diesel::QueryResult<Vec<LabelRow>> {
    if categories.is_empty() {
        return Ok(Vec::new());
    }
    list_labels_sql(user_id, categories)
        .into_query()
        .load(conn)
        .await
}

/// ## Errors
/// Returns database errors if the query fails.
pub async fn list_children(
    conn: &mut AsyncPgConnection,
    user_id: &str,
    parent: ParentRef,
    child_categories: &[Category],
) -> diesel::QueryResult<Vec<SummaryRow>> {
    if child_categories.is_empty() {
        return Ok(Vec::new());
    }
    list_children_sql(user_id, parent, child_categories)
        .into_query()
        .load(conn)
        .await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_list_sql_applies_one_global_window() {
        let query = ListQuery {
            offset: 20,
            limit: 20,
            search: EntitySearch::new("", [Category::Room, Category::Building]),
        };
        let builder = list_summaries_sql("u1", &query);
        let sql = builder.sql();

        assert_eq!(sql.matches("UNION ALL").count(), 1);
        assert_eq!(sql.matches("LIMIT").count(), 1);
        assert!(sql.ends_with("ORDER BY depth DESC, id ASC LIMIT $2 OFFSET $3"));
        assert!(sql.find("FROM buildings") < sql.find("FROM rooms"));
        assert!(!sql.contains("LIKE"));
        assert_eq!(
            builder.binds(),
            &[
                BindValue::Text("u1".to_string()),
                BindValue::BigInt(20),
                BindValue::BigInt(20)
            ]
        );
    }

    #[test]
    fn test_search_includes_address_for_buildings_only() {
        let search = EntitySearch::new("Main St", [Category::Building, Category::Item]);
        let builder = count_matching_sql("u1", &search);
        let sql = builder.sql();

        assert_eq!(sql.matches("COALESCE(address, '')").count(), 1);
        assert_eq!(sql.matches("LOWER(name) LIKE $2").count(), 2);
        assert!(sql.contains(") + ("));
        assert_eq!(builder.binds()[1], BindValue::Text("%main st%".to_string()));
    }

    #[test]
    fn test_count_children_sums_every_child_table() {
        let parent = ParentRef::new(4, Category::Room);
        let builder =
            count_children_sql("u1", parent, &Category::Room.child_categories());
        let sql = builder.sql();

        assert!(sql.contains("FROM shelving_units"));
        assert!(sql.contains("FROM containers"));
        assert!(sql.contains("FROM items"));
        assert_eq!(sql.matches(" + ").count(), 2);
        assert_eq!(builder.binds()[2], BindValue::Text("room".to_string()));
    }

    #[test]
    fn test_labels_tag_each_category() {
        let builder = list_labels_sql("u1", Category::Item.legal_parents());
        let sql = builder.sql();

        assert!(sql.contains("'container'::text AS category"));
        assert!(sql.contains("'shelf'::text AS category"));
        assert!(sql.contains("'room'::text AS category"));
        assert!(sql.ends_with("ORDER BY depth DESC, id ASC"));
    }
}
