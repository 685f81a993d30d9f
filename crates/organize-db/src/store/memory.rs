use std::cmp::Reverse;
use std::collections::{BTreeMap, HashMap};

use chrono::Utc;
use futures::future::BoxFuture;
use tokio::sync::RwLock;

use organize_core::category::Category;
use organize_core::model::{
    Entity, EntityFields, EntityId, EntitySearch, EntitySummary, ListQuery, ParentCandidate,
    ParentRef,
};

use super::EntityStore;
use crate::error::{StoreError, StoreResult};

#[derive(Debug, Default)]
struct MemoryState {
    rows: BTreeMap<(Category, EntityId), Entity>,
    next_ids: HashMap<Category, EntityId>,
}

impl MemoryState {
    fn live(&self, user_id: &str, category: Category, id: EntityId) -> Option<&Entity> {
        self.rows
            .get(&(category, id))
            .filter(|e| e.user_id == user_id && e.deleted_at.is_none())
    }

    fn live_rows<'s>(&'s self, user_id: &'s str) -> impl Iterator<Item = &'s Entity> + 's {
        self.rows
            .values()
            .filter(move |e| e.user_id == user_id && e.deleted_at.is_none())
    }

    fn ensure_parent(&self, user_id: &str, category: Category, fields: &EntityFields) -> StoreResult<()> {
        match fields.parent.filter(|_| !category.is_root()) {
            Some(parent) if self.live(user_id, parent.category, parent.id).is_none() => {
                Err(StoreError::ParentNotFound {
                    category: parent.category,
                    id: parent.id,
                })
            }
            _ => Ok(()),
        }
    }

    fn children_of<'s>(
        &'s self,
        user_id: &'s str,
        parent: ParentRef,
        child_categories: &'s [Category],
    ) -> impl Iterator<Item = &'s Entity> + 's {
        self.live_rows(user_id).filter(move |e| {
            child_categories.contains(&e.category) && e.parent == Some(parent)
        })
    }

    fn matching<'s>(
        &'s self,
        user_id: &'s str,
        search: &'s EntitySearch,
    ) -> impl Iterator<Item = &'s Entity> + 's {
        let categories = search.categories();
        self.live_rows(user_id).filter(move |e| {
            categories.contains(&e.category)
                && search.matches(&e.name, e.notes.as_deref(), e.address.as_deref())
        })
    }
}

/// Listing order shared with the SQL queries: buildings first, then by id.
fn sorted<'e>(entities: impl Iterator<Item = &'e Entity>) -> Vec<&'e Entity> {
    let mut entities: Vec<&Entity> = entities.collect();
    entities.sort_by_key(|e| (Reverse(e.category.depth()), e.id));
    entities
}

fn to_count(n: usize) -> i64 {
    i64::try_from(n).unwrap_or(i64::MAX)
}

/// In-process [`EntityStore`] with the same observable semantics as the
/// PostgreSQL store. Ids are allocated per category starting at 1.
#[derive(Debug, Default)]
pub struct MemoryEntityStore {
    state: RwLock<MemoryState>,
}

impl MemoryEntityStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl EntityStore for MemoryEntityStore {
    fn create<'a>(
        &'a self,
        user_id: &'a str,
        category: Category,
        fields: &'a EntityFields,
    ) -> BoxFuture<'a, StoreResult<EntityId>> {
        Box::pin(async move {
            let mut state = self.state.write().await;
            state.ensure_parent(user_id, category, fields)?;

            let next = state.next_ids.entry(category).or_insert(0);
            *next += 1;
            let id = *next;

            let now = Utc::now();
            let (parent, address) = if category.is_root() {
                (None, fields.address.clone())
            } else {
                (fields.parent, None)
            };
            state.rows.insert(
                (category, id),
                Entity {
                    id,
                    category,
                    user_id: user_id.to_string(),
                    name: fields.name.clone(),
                    notes: fields.notes.clone(),
                    parent,
                    address,
                    created_at: now,
                    updated_at: now,
                    deleted_at: None,
                },
            );
            Ok(id)
        })
    }

    fn get_one<'a>(
        &'a self,
        user_id: &'a str,
        category: Category,
        id: EntityId,
    ) -> BoxFuture<'a, StoreResult<Entity>> {
        Box::pin(async move {
            let state = self.state.read().await;
            state
                .live(user_id, category, id)
                .cloned()
                .ok_or(StoreError::NotFound { category, id })
        })
    }

    fn update<'a>(
        &'a self,
        user_id: &'a str,
        category: Category,
        id: EntityId,
        fields: &'a EntityFields,
    ) -> BoxFuture<'a, StoreResult<Entity>> {
        Box::pin(async move {
            let mut state = self.state.write().await;
            state.ensure_parent(user_id, category, fields)?;

            let entity = state
                .rows
                .get_mut(&(category, id))
                .filter(|e| e.user_id == user_id && e.deleted_at.is_none())
                .ok_or(StoreError::NotFound { category, id })?;

            entity.name.clone_from(&fields.name);
            entity.notes.clone_from(&fields.notes);
            if category.is_root() {
                entity.address.clone_from(&fields.address);
            } else {
                entity.parent = fields.parent;
            }
            entity.updated_at = Utc::now();
            Ok(entity.clone())
        })
    }

    fn soft_delete<'a>(
        &'a self,
        user_id: &'a str,
        category: Category,
        id: EntityId,
        child_categories: &'a [Category],
    ) -> BoxFuture<'a, StoreResult<()>> {
        Box::pin(async move {
            let mut state = self.state.write().await;
            if state.live(user_id, category, id).is_none() {
                return Err(StoreError::NotFound { category, id });
            }

            let count = to_count(
                state
                    .children_of(user_id, ParentRef::new(id, category), child_categories)
                    .count(),
            );
            if count > 0 {
                return Err(StoreError::HasChildren {
                    category,
                    id,
                    count,
                });
            }

            if let Some(entity) = state.rows.get_mut(&(category, id)) {
                let now = Utc::now();
                entity.deleted_at = Some(now);
                entity.updated_at = now;
            }
            Ok(())
        })
    }

    fn count_children<'a>(
        &'a self,
        user_id: &'a str,
        parent: ParentRef,
        child_categories: &'a [Category],
    ) -> BoxFuture<'a, StoreResult<i64>> {
        Box::pin(async move {
            let state = self.state.read().await;
            Ok(to_count(
                state.children_of(user_id, parent, child_categories).count(),
            ))
        })
    }

    fn list_entities<'a>(
        &'a self,
        user_id: &'a str,
        query: &'a ListQuery,
    ) -> BoxFuture<'a, StoreResult<Vec<EntitySummary>>> {
        Box::pin(async move {
            let state = self.state.read().await;
            let offset = usize::try_from(query.offset).unwrap_or_default();
            let limit = usize::try_from(query.limit).unwrap_or_default();
            Ok(sorted(state.matching(user_id, &query.search))
                .into_iter()
                .skip(offset)
                .take(limit)
                .map(|e| EntitySummary::from(e.clone()))
                .collect())
        })
    }

    fn count_entities<'a>(
        &'a self,
        user_id: &'a str,
        search: &'a EntitySearch,
    ) -> BoxFuture<'a, StoreResult<i64>> {
        Box::pin(async move {
            let state = self.state.read().await;
            Ok(to_count(state.matching(user_id, search).count()))
        })
    }

    fn parent_candidates<'a>(
        &'a self,
        user_id: &'a str,
        categories: &'a [Category],
    ) -> BoxFuture<'a, StoreResult<Vec<ParentCandidate>>> {
        Box::pin(async move {
            let state = self.state.read().await;
            let candidates = state
                .live_rows(user_id)
                .filter(|e| categories.contains(&e.category));
            Ok(sorted(candidates).into_iter().map(Entity::label).collect())
        })
    }

    fn children<'a>(
        &'a self,
        user_id: &'a str,
        parent: ParentRef,
        child_categories: &'a [Category],
    ) -> BoxFuture<'a, StoreResult<Vec<EntitySummary>>> {
        Box::pin(async move {
            let state = self.state.read().await;
            Ok(sorted(state.children_of(user_id, parent, child_categories))
                .into_iter()
                .map(|e| EntitySummary::from(e.clone()))
                .collect())
        })
    }
}
