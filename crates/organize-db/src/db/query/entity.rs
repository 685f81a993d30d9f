//! Single-table statements against one category table.

use diesel::OptionalExtension;
use diesel_async::{AsyncPgConnection, RunQueryDsl};

use organize_core::category::Category;
use organize_core::model::{EntityFields, EntityId, ParentRef};

use super::builder::{BindValue, SqlBuilder};
use crate::model::row::{EntityRow, IdRow};

const ROOT_COLUMNS: &str = "id, user_id, name, notes, NULL::bigint AS parent_id, \
     NULL::text AS parent_category, address, created_at, updated_at, deleted_at";

const CHILD_COLUMNS: &str = "id, user_id, name, notes, parent_id, parent_category, \
     NULL::text AS address, created_at, updated_at, deleted_at";

/// Row lock taken by [`lock_live`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowLock {
    /// Blocks deletes and key updates of the row, not other key-share holders.
    KeyShare,
    /// Exclusive lock for the row about to be soft-deleted.
    Update,
}

impl RowLock {
    const fn clause(self) -> &'static str {
        match self {
            Self::KeyShare => "FOR KEY SHARE",
            Self::Update => "FOR UPDATE",
        }
    }
}

/// Column list producing an [`EntityRow`] for `category`.
#[must_use]
pub const fn entity_columns(category: Category) -> &'static str {
    if category.is_root() {
        ROOT_COLUMNS
    } else {
        CHILD_COLUMNS
    }
}

/// ## Summary
/// Loads a live row owned by `user_id`.
///
/// ## Errors
/// Returns database errors if the query fails.
pub async fn find_live(
    conn: &mut AsyncPgConnection,
    category: Category,
    user_id: &str,
    id: EntityId,
) -> diesel::QueryResult<Option<EntityRow>> {
    let mut builder = SqlBuilder::new();
    let id_param = builder.bind(BindValue::BigInt(id));
    let user_param = builder.bind(BindValue::Text(user_id.to_string()));
    builder.push(&format!(
        "SELECT {columns} FROM {table} \
         WHERE id = {id_param} AND user_id = {user_param} AND deleted_at IS NULL",
        columns = entity_columns(category),
        table = category.table_name(),
    ));

    builder.into_query().get_result(conn).await.optional()
}

/// ## Summary
/// Locks a live row owned by `user_id`. Must run inside a transaction.
///
/// Returns `false` if no such row exists.
///
/// ## Errors
/// Returns database errors if the query fails.
pub async fn lock_live(
    conn: &mut AsyncPgConnection,
    category: Category,
    user_id: &str,
    id: EntityId,
    lock: RowLock,
) -> diesel::QueryResult<bool> {
    let mut builder = SqlBuilder::new();
    let id_param = builder.bind(BindValue::BigInt(id));
    let user_param = builder.bind(BindValue::Text(user_id.to_string()));
    builder.push(&format!(
        "SELECT id FROM {table} \
         WHERE id = {id_param} AND user_id = {user_param} AND deleted_at IS NULL {lock}",
        table = category.table_name(),
        lock = lock.clause(),
    ));

    let row: Option<IdRow> = builder.into_query().get_result(conn).await.optional()?;
    Ok(row.is_some())
}

/// ## Summary
/// Inserts a new row and returns its id.
///
/// ## Errors
/// Returns database errors if the insert fails.
pub async fn insert(
    conn: &mut AsyncPgConnection,
    category: Category,
    user_id: &str,
    fields: &EntityFields,
) -> diesel::QueryResult<EntityId> {
    let mut builder = SqlBuilder::new();
    let user_param = builder.bind(BindValue::Text(user_id.to_string()));
    let name_param = builder.bind(BindValue::Text(fields.name.clone()));
    let notes_param = builder.bind(BindValue::NullableText(fields.notes.clone()));
    let table = category.table_name();

    match parent_of(category, fields) {
        Some(parent) => {
            let parent_id = builder.bind(BindValue::BigInt(parent.id));
            let parent_category =
                builder.bind(BindValue::Text(parent.category.as_str().to_string()));
            builder.push(&format!(
                "INSERT INTO {table} (user_id, name, notes, parent_id, parent_category) \
                 VALUES ({user_param}, {name_param}, {notes_param}, {parent_id}, {parent_category}) \
                 RETURNING id"
            ));
        }
        None => {
            let address_param = builder.bind(BindValue::NullableText(fields.address.clone()));
            builder.push(&format!(
                "INSERT INTO {table} (user_id, name, notes, address) \
                 VALUES ({user_param}, {name_param}, {notes_param}, {address_param}) \
                 RETURNING id"
            ));
        }
    }

    let row: IdRow = builder.into_query().get_result(conn).await?;
    Ok(row.id)
}

/// ## Summary
/// Overwrites every editable field of a live row and bumps `updated_at`.
///
/// Returns `None` if the row is missing, deleted or owned by someone else.
///
/// ## Errors
/// Returns database errors if the update fails.
pub async fn update(
    conn: &mut AsyncPgConnection,
    category: Category,
    user_id: &str,
    id: EntityId,
    fields: &EntityFields,
) -> diesel::QueryResult<Option<EntityRow>> {
    let mut builder = SqlBuilder::new();
    let id_param = builder.bind(BindValue::BigInt(id));
    let user_param = builder.bind(BindValue::Text(user_id.to_string()));
    let name_param = builder.bind(BindValue::Text(fields.name.clone()));
    let notes_param = builder.bind(BindValue::NullableText(fields.notes.clone()));

    let assignments = match parent_of(category, fields) {
        Some(parent) => {
            let parent_id = builder.bind(BindValue::BigInt(parent.id));
            let parent_category =
                builder.bind(BindValue::Text(parent.category.as_str().to_string()));
            format!("parent_id = {parent_id}, parent_category = {parent_category}")
        }
        None => {
            let address_param = builder.bind(BindValue::NullableText(fields.address.clone()));
            format!("address = {address_param}")
        }
    };

    builder.push(&format!(
        "UPDATE {table} SET name = {name_param}, notes = {notes_param}, {assignments}, \
         updated_at = now() \
         WHERE id = {id_param} AND user_id = {user_param} AND deleted_at IS NULL \
         RETURNING {columns}",
        table = category.table_name(),
        columns = entity_columns(category),
    ));

    builder.into_query().get_result(conn).await.optional()
}

/// ## Summary
/// Sets `deleted_at` on a live row. Returns the number of rows touched.
///
/// ## Errors
/// Returns database errors if the update fails.
pub async fn mark_deleted(
    conn: &mut AsyncPgConnection,
    category: Category,
    user_id: &str,
    id: EntityId,
) -> diesel::QueryResult<usize> {
    let mut builder = SqlBuilder::new();
    let id_param = builder.bind(BindValue::BigInt(id));
    let user_param = builder.bind(BindValue::Text(user_id.to_string()));
    builder.push(&format!(
        "UPDATE {table} SET deleted_at = now(), updated_at = now() \
         WHERE id = {id_param} AND user_id = {user_param} AND deleted_at IS NULL",
        table = category.table_name(),
    ));

    builder.into_query().execute(conn).await
}

/// Returns the parent a row would be checked against, if `category` has one.
#[must_use]
pub fn parent_of(category: Category, fields: &EntityFields) -> Option<ParentRef> {
    if category.is_root() {
        None
    } else {
        fields.parent
    }
}
