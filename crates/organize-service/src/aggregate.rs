//! Cross-category views: the paginated listing, totals, parent candidates
//! and direct children.

use std::collections::HashMap;
use std::sync::Arc;

use organize_core::category::{Category, HierarchyRules};
use organize_core::model::{
    Entity, EntityId, EntityLabel, EntitySearch, EntitySummary, ListQuery, ParentCandidate,
    ParentRef,
};
use organize_db::error::StoreError;
use organize_db::store::EntityStore;

use crate::error::{ServiceError, ServiceResult};

pub struct AggregationEngine {
    rules: Arc<HierarchyRules>,
    store: Arc<dyn EntityStore>,
}

impl AggregationEngine {
    #[must_use]
    pub fn new(rules: Arc<HierarchyRules>, store: Arc<dyn EntityStore>) -> Self {
        Self { rules, store }
    }

    /// ## Summary
    /// One window of the listing, each row with its ancestry trail.
    ///
    /// ## Errors
    /// Returns `BackendUnavailable` if the store cannot be reached.
    #[tracing::instrument(skip(self))]
    pub async fn list_entities(
        &self,
        user_id: &str,
        query: &ListQuery,
    ) -> ServiceResult<Vec<EntitySummary>> {
        let mut entities = self.store.list_entities(user_id, query).await?;

        let mut seen = HashMap::new();
        for entity in &mut entities {
            entity.ancestors = self.ancestors(user_id, entity.parent, &mut seen).await?;
        }

        Ok(entities)
    }

    /// ## Errors
    /// Returns `BackendUnavailable` if the store cannot be reached.
    #[tracing::instrument(skip(self))]
    pub async fn count_entities(&self, user_id: &str, search: &EntitySearch) -> ServiceResult<i64> {
        Ok(self.store.count_entities(user_id, search).await?)
    }

    /// ## Summary
    /// Every live entity that may hold an entity of `category`.
    ///
    /// ## Errors
    /// `InvalidParent` for the root category, which has no legal parents.
    #[tracing::instrument(skip(self))]
    pub async fn get_parents(
        &self,
        user_id: &str,
        category: Category,
    ) -> ServiceResult<Vec<ParentCandidate>> {
        let parents = self.rules.legal_parents(category);
        if parents.is_empty() {
            return Err(ServiceError::InvalidParent(format!(
                "{category} has no parent categories"
            )));
        }
        Ok(self.store.parent_candidates(user_id, parents).await?)
    }

    /// ## Summary
    /// Direct live children of an entity, across every child category.
    ///
    /// ## Errors
    /// `NotFound` if the entity is missing, deleted or foreign.
    #[tracing::instrument(skip(self))]
    pub async fn get_children(
        &self,
        user_id: &str,
        category: Category,
        id: EntityId,
    ) -> ServiceResult<Vec<EntitySummary>> {
        self.store.get_one(user_id, category, id).await?;
        let child_categories = category.deeper_categories();
        Ok(self
            .store
            .children(user_id, ParentRef::new(id, category), &child_categories)
            .await?)
    }

    /// Walks up from `parent` to the root. `seen` memoizes lookups across
    /// the rows of one page, which usually share ancestors.
    async fn ancestors(
        &self,
        user_id: &str,
        mut parent: Option<ParentRef>,
        seen: &mut HashMap<ParentRef, Option<Entity>>,
    ) -> ServiceResult<Vec<EntityLabel>> {
        let mut trail = Vec::new();

        // Parents are strictly deeper, so the walk ends within the number of
        // categories.
        for _ in 0..Category::ALL.len() {
            let Some(current) = parent else { break };

            let entity = match seen.get(&current) {
                Some(entity) => entity.clone(),
                None => {
                    let entity = match self.store.get_one(user_id, current.category, current.id).await {
                        Ok(entity) => Some(entity),
                        Err(StoreError::NotFound { .. }) => None,
                        Err(err) => return Err(err.into()),
                    };
                    seen.insert(current, entity.clone());
                    entity
                }
            };

            let Some(entity) = entity else {
                tracing::warn!(?current, "Ancestor missing from store");
                break;
            };
            trail.push(entity.label());
            parent = entity.parent;
        }

        Ok(trail)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use organize_core::model::EntityFields;
    use organize_db::store::MemoryEntityStore;

    async fn create(
        store: &MemoryEntityStore,
        category: Category,
        name: &str,
        parent: Option<ParentRef>,
    ) -> ParentRef {
        let fields = EntityFields {
            name: name.to_string(),
            parent,
            ..EntityFields::default()
        };
        let id = store.create("u1", category, &fields).await.unwrap();
        ParentRef::new(id, category)
    }

    fn engine(store: Arc<MemoryEntityStore>) -> AggregationEngine {
        AggregationEngine::new(Arc::new(HierarchyRules::default()), store)
    }

    #[test_log::test(tokio::test)]
    async fn test_listing_carries_ancestry() {
        let store = Arc::new(MemoryEntityStore::new());
        let hq = create(&store, Category::Building, "HQ", None).await;
        let lobby = create(&store, Category::Room, "Lobby", Some(hq)).await;
        create(&store, Category::Item, "Umbrella", Some(lobby)).await;

        let query = ListQuery {
            offset: 0,
            limit: 20,
            search: EntitySearch::new("umbrella", []),
        };
        let page = engine(store).list_entities("u1", &query).await.unwrap();

        assert_eq!(page.len(), 1);
        let trail: Vec<(&str, Category)> = page[0]
            .ancestors
            .iter()
            .map(|label| (label.name.as_str(), label.category))
            .collect();
        assert_eq!(
            trail,
            vec![("Lobby", Category::Room), ("HQ", Category::Building)]
        );
    }

    #[test_log::test(tokio::test)]
    async fn test_parents_for_root_rejected() {
        let engine = engine(Arc::new(MemoryEntityStore::new()));
        assert!(matches!(
            engine.get_parents("u1", Category::Building).await,
            Err(ServiceError::InvalidParent(_))
        ));
    }

    #[test_log::test(tokio::test)]
    async fn test_parents_ordered_root_first() {
        let store = Arc::new(MemoryEntityStore::new());
        let hq = create(&store, Category::Building, "HQ", None).await;
        let lobby = create(&store, Category::Room, "Lobby", Some(hq)).await;
        let rack = create(&store, Category::ShelvingUnit, "Rack", Some(lobby)).await;
        create(&store, Category::Shelf, "Top", Some(rack)).await;

        let parents = engine(store).get_parents("u1", Category::Item).await.unwrap();
        let categories: Vec<Category> = parents.iter().map(|p| p.category).collect();
        assert_eq!(categories, vec![Category::Room, Category::Shelf]);
    }

    #[test_log::test(tokio::test)]
    async fn test_children_of_missing_entity() {
        let engine = engine(Arc::new(MemoryEntityStore::new()));
        assert!(matches!(
            engine.get_children("u1", Category::Room, 5).await,
            Err(ServiceError::NotFound { .. })
        ));
    }
}
