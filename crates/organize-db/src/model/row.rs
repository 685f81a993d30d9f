//! Row shapes returned by the raw inventory queries.

use chrono::{DateTime, Utc};
use diesel::QueryableByName;
use diesel::sql_types::{BigInt, Nullable, Text, Timestamptz};

use organize_core::category::Category;
use organize_core::model::{Entity, EntityLabel, EntityId, EntitySummary, ParentRef};

use crate::db::enums::DbCategory;

/// Full row of one category table. Buildings select `NULL` parent columns,
/// every other table selects a `NULL` address.
#[derive(Debug, Clone, QueryableByName)]
pub struct EntityRow {
    #[diesel(sql_type = BigInt)]
    pub id: i64,
    #[diesel(sql_type = Text)]
    pub user_id: String,
    #[diesel(sql_type = Text)]
    pub name: String,
    #[diesel(sql_type = Nullable<Text>)]
    pub notes: Option<String>,
    #[diesel(sql_type = Nullable<BigInt>)]
    pub parent_id: Option<i64>,
    #[diesel(sql_type = Nullable<Text>)]
    pub parent_category: Option<DbCategory>,
    #[diesel(sql_type = Nullable<Text>)]
    pub address: Option<String>,
    #[diesel(sql_type = Timestamptz)]
    pub created_at: DateTime<Utc>,
    #[diesel(sql_type = Timestamptz)]
    pub updated_at: DateTime<Utc>,
    #[diesel(sql_type = Nullable<Timestamptz>)]
    pub deleted_at: Option<DateTime<Utc>>,
}

impl EntityRow {
    #[must_use]
    pub fn into_entity(self, category: Category) -> Entity {
        Entity {
            id: self.id,
            category,
            user_id: self.user_id,
            name: self.name,
            notes: self.notes,
            parent: parent_ref(self.parent_id, self.parent_category),
            address: self.address,
            created_at: self.created_at,
            updated_at: self.updated_at,
            deleted_at: self.deleted_at,
        }
    }
}

/// One row of a category-tagged union over several tables.
#[derive(Debug, Clone, QueryableByName)]
pub struct SummaryRow {
    #[diesel(sql_type = Text)]
    pub category: DbCategory,
    #[diesel(sql_type = BigInt)]
    pub id: i64,
    #[diesel(sql_type = Text)]
    pub name: String,
    #[diesel(sql_type = Nullable<Text>)]
    pub notes: Option<String>,
    #[diesel(sql_type = Nullable<Text>)]
    pub address: Option<String>,
    #[diesel(sql_type = Nullable<BigInt>)]
    pub parent_id: Option<i64>,
    #[diesel(sql_type = Nullable<Text>)]
    pub parent_category: Option<DbCategory>,
}

impl From<SummaryRow> for EntitySummary {
    fn from(row: SummaryRow) -> Self {
        Self {
            id: row.id,
            category: row.category.into(),
            name: row.name,
            notes: row.notes,
            address: row.address,
            parent: parent_ref(row.parent_id, row.parent_category),
            ancestors: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, QueryableByName)]
pub struct LabelRow {
    #[diesel(sql_type = Text)]
    pub category: DbCategory,
    #[diesel(sql_type = BigInt)]
    pub id: i64,
    #[diesel(sql_type = Text)]
    pub name: String,
}

impl From<LabelRow> for EntityLabel {
    fn from(row: LabelRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            category: row.category.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, QueryableByName)]
pub struct IdRow {
    #[diesel(sql_type = BigInt)]
    pub id: EntityId,
}

#[derive(Debug, Clone, Copy, QueryableByName)]
pub struct TotalRow {
    #[diesel(sql_type = BigInt)]
    pub total: i64,
}

fn parent_ref(id: Option<i64>, category: Option<DbCategory>) -> Option<ParentRef> {
    Some(ParentRef::new(id?, category?.into()))
}
