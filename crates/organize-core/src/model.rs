//! Inventory domain types shared by the store, service and HTTP layers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::category::Category;

/// Row id. Unique within a category table, not across tables.
pub type EntityId = i64;

/// Reference to a parent entity: its id and the table it lives in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ParentRef {
    pub id: EntityId,
    pub category: Category,
}

impl ParentRef {
    #[must_use]
    pub const fn new(id: EntityId, category: Category) -> Self {
        Self { id, category }
    }
}

/// Caller-supplied fields for create and edit.
///
/// `parent` is only meaningful for non-root categories, `address` only for
/// buildings. Edits overwrite every field.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntityFields {
    pub name: String,
    pub notes: Option<String>,
    pub parent: Option<ParentRef>,
    pub address: Option<String>,
}

/// A stored entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Entity {
    pub id: EntityId,
    pub category: Category,
    pub user_id: String,
    pub name: String,
    pub notes: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub parent: Option<ParentRef>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub address: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Entity {
    /// Short label used in breadcrumbs and parent listings.
    #[must_use]
    pub fn label(&self) -> EntityLabel {
        EntityLabel {
            id: self.id,
            name: self.name.clone(),
            category: self.category,
        }
    }
}

/// `{id, name, category}` triple. Used for parent candidates and for the
/// ancestry trail of listed entities, where the category disambiguates
/// same-named entities on different levels.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityLabel {
    pub id: EntityId,
    pub name: String,
    pub category: Category,
}

/// A live entity that may be chosen as a parent.
pub type ParentCandidate = EntityLabel;

/// One row of the aggregated entity listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntitySummary {
    pub id: EntityId,
    pub category: Category,
    pub name: String,
    pub notes: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub parent: Option<ParentRef>,
    /// Direct parent first, root building last. Empty for root entities.
    #[serde(default)]
    pub ancestors: Vec<EntityLabel>,
}

impl From<Entity> for EntitySummary {
    fn from(entity: Entity) -> Self {
        Self {
            id: entity.id,
            category: entity.category,
            name: entity.name,
            notes: entity.notes,
            address: entity.address,
            parent: entity.parent,
            ancestors: Vec::new(),
        }
    }
}

/// Search text and category filter applied to listings and counts.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct EntitySearch {
    search: String,
    filters: Vec<Category>,
}

impl EntitySearch {
    /// Builds a search. Filters are deduplicated and ordered root first so two
    /// equivalent filter sets compare (and cache) equal.
    #[must_use]
    pub fn new(search: impl Into<String>, filters: impl IntoIterator<Item = Category>) -> Self {
        let mut filters: Vec<Category> = filters.into_iter().collect();
        filters.sort_by_key(|c| std::cmp::Reverse(c.depth()));
        filters.dedup();
        Self {
            search: search.into().trim().to_string(),
            filters,
        }
    }

    /// Trimmed search text; empty means "match everything".
    #[must_use]
    pub fn search(&self) -> &str {
        &self.search
    }

    /// The explicit filter set; empty means every category.
    #[must_use]
    pub fn filters(&self) -> &[Category] {
        &self.filters
    }

    /// Categories this search covers, root first.
    #[must_use]
    pub fn categories(&self) -> Vec<Category> {
        if self.filters.is_empty() {
            Category::ALL.to_vec()
        } else {
            self.filters.clone()
        }
    }

    /// Lower-cased `LIKE` pattern for the search text, if any.
    #[must_use]
    pub fn like_pattern(&self) -> Option<String> {
        if self.search.is_empty() {
            None
        } else {
            let escaped = self
                .search
                .to_lowercase()
                .replace('\\', "\\\\")
                .replace('%', "\\%")
                .replace('_', "\\_");
            Some(format!("%{escaped}%"))
        }
    }

    /// Case-insensitive match against the searchable text of an entity.
    #[must_use]
    pub fn matches(&self, name: &str, notes: Option<&str>, address: Option<&str>) -> bool {
        if self.search.is_empty() {
            return true;
        }
        let needle = self.search.to_lowercase();
        [Some(name), notes, address]
            .into_iter()
            .flatten()
            .any(|text| text.to_lowercase().contains(&needle))
    }
}

/// A page request over the aggregated listing.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ListQuery {
    pub offset: i64,
    pub limit: i64,
    pub search: EntitySearch,
}

/// One page of the aggregated listing plus the total matching count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityPage {
    pub entities: Vec<EntitySummary>,
    pub offset: i64,
    pub limit: i64,
    pub total_count: i64,
}

impl EntityPage {
    /// `start-end/total` window descriptor, e.g. `0-20/57`.
    #[must_use]
    pub fn content_range(&self) -> String {
        format!(
            "{}-{}/{}",
            self.offset,
            self.offset.saturating_add(self.limit),
            self.total_count
        )
    }
}
