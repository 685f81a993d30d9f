//! Inventory service facade used by the HTTP layer.

use std::sync::Arc;
use std::time::Duration;

use organize_core::category::{Category, HierarchyRules};
use organize_core::config::{PaginationConfig, Settings};
use organize_core::model::{
    Entity, EntityFields, EntityId, EntityPage, EntitySummary, ListQuery, ParentCandidate,
};
use organize_db::cache::CacheBackend;
use organize_db::store::EntityStore;

use crate::aggregate::AggregationEngine;
use crate::cache::{CacheCoordinator, key};
use crate::deletion::DeletionGuard;
use crate::error::{ServiceError, ServiceResult};
use crate::hierarchy::HierarchyValidator;
use crate::query::ListParams;

/// Tunables of [`InventoryService`].
#[derive(Debug, Clone)]
pub struct ServiceOptions {
    pub rules: HierarchyRules,
    pub parents_ttl: Duration,
    pub pagination: PaginationConfig,
}

impl Default for ServiceOptions {
    fn default() -> Self {
        Self {
            rules: HierarchyRules::default(),
            parents_ttl: Duration::from_secs(300),
            pagination: PaginationConfig::default(),
        }
    }
}

impl ServiceOptions {
    /// ## Errors
    /// Returns an error if the `[hierarchy]` overrides are invalid.
    pub fn from_settings(settings: &Settings) -> ServiceResult<Self> {
        Ok(Self {
            rules: settings.hierarchy_rules()?,
            parents_ttl: Duration::from_secs(settings.cache.parents_ttl_secs),
            pagination: settings.pagination,
        })
    }
}

pub struct InventoryService {
    store: Arc<dyn EntityStore>,
    validator: HierarchyValidator,
    aggregation: AggregationEngine,
    deletion: DeletionGuard,
    cache: CacheCoordinator,
    pagination: PaginationConfig,
}

impl InventoryService {
    #[must_use]
    pub fn new(
        store: Arc<dyn EntityStore>,
        cache: Arc<dyn CacheBackend>,
        options: ServiceOptions,
    ) -> Self {
        let rules = Arc::new(options.rules);
        Self {
            validator: HierarchyValidator::new(rules.clone(), store.clone()),
            aggregation: AggregationEngine::new(rules.clone(), store.clone()),
            deletion: DeletionGuard::new(store.clone()),
            cache: CacheCoordinator::new(cache, options.parents_ttl),
            pagination: options.pagination,
            store,
        }
    }

    /// ## Errors
    /// See [`ListParams::parse`].
    pub fn parse_list_query(&self, params: &ListParams<'_>) -> ServiceResult<ListQuery> {
        params.parse(self.pagination)
    }

    /// ## Summary
    /// Validates the parent, inserts the entity and invalidates the user's
    /// cached views.
    ///
    /// ## Errors
    /// `ValidationFailed`, `InvalidParent` or `ParentNotFound` when the
    /// request is rejected; `BackendUnavailable` if the store is unreachable.
    #[tracing::instrument(skip(self, fields), fields(name = %fields.name))]
    pub async fn create(
        &self,
        user_id: &str,
        category: Category,
        fields: EntityFields,
    ) -> ServiceResult<Entity> {
        let fields = normalized(fields)?;
        self.validator
            .validate(user_id, category, fields.parent)
            .await?;

        let id = self.store.create(user_id, category, &fields).await?;
        tracing::info!(user_id, %category, id, "Entity created");

        self.cache.invalidate_for_user(user_id).await;
        Ok(self.store.get_one(user_id, category, id).await?)
    }

    /// ## Summary
    /// Overwrites every field of an entity and invalidates the user's cached
    /// views.
    ///
    /// ## Errors
    /// As [`InventoryService::create`], plus `NotFound` for a missing entity.
    #[tracing::instrument(skip(self, fields), fields(name = %fields.name))]
    pub async fn edit(
        &self,
        user_id: &str,
        category: Category,
        id: EntityId,
        fields: EntityFields,
    ) -> ServiceResult<Entity> {
        let fields = normalized(fields)?;
        self.validator
            .validate(user_id, category, fields.parent)
            .await?;

        let entity = self.store.update(user_id, category, id, &fields).await?;
        tracing::info!(user_id, %category, id, "Entity updated");

        self.cache.invalidate_for_user(user_id).await;
        Ok(entity)
    }

    /// ## Summary
    /// Soft-deletes an entity without children and invalidates the user's
    /// cached views.
    ///
    /// ## Errors
    /// `NotFound` or `HasChildren`; nothing is changed in either case.
    #[tracing::instrument(skip(self))]
    pub async fn delete(&self, user_id: &str, category: Category, id: EntityId) -> ServiceResult<()> {
        self.deletion.delete(user_id, category, id).await?;
        tracing::info!(user_id, %category, id, "Entity deleted");

        self.cache.invalidate_for_user(user_id).await;
        Ok(())
    }

    /// ## Errors
    /// `NotFound` if the entity is missing, deleted or foreign.
    #[tracing::instrument(skip(self))]
    pub async fn get(&self, user_id: &str, category: Category, id: EntityId) -> ServiceResult<Entity> {
        Ok(self.store.get_one(user_id, category, id).await?)
    }

    /// ## Summary
    /// One page of the aggregated listing plus the matching total. Both
    /// halves are cached independently.
    ///
    /// ## Errors
    /// `BackendUnavailable` if the store is unreachable on a cache miss.
    #[tracing::instrument(skip(self))]
    pub async fn list_entities(&self, user_id: &str, query: &ListQuery) -> ServiceResult<EntityPage> {
        let list_key = key::list_key(user_id, query)?;
        let entities = self
            .cache
            .read_through(&list_key, None, || {
                self.aggregation.list_entities(user_id, query)
            })
            .await?;

        let count_key = key::count_key(user_id, &query.search)?;
        let total_count = self
            .cache
            .read_through(&count_key, None, || {
                self.aggregation.count_entities(user_id, &query.search)
            })
            .await?;

        Ok(EntityPage {
            entities,
            offset: query.offset,
            limit: query.limit,
            total_count,
        })
    }

    /// ## Errors
    /// `InvalidParent` for the root category.
    #[tracing::instrument(skip(self))]
    pub async fn get_parents(
        &self,
        user_id: &str,
        category: Category,
    ) -> ServiceResult<Vec<ParentCandidate>> {
        let parents_key = key::parents_key(user_id, category)?;
        self.cache
            .read_through(&parents_key, Some(self.cache.parents_ttl()), || {
                self.aggregation.get_parents(user_id, category)
            })
            .await
    }

    /// ## Errors
    /// `NotFound` if the entity is missing, deleted or foreign.
    #[tracing::instrument(skip(self))]
    pub async fn get_children(
        &self,
        user_id: &str,
        category: Category,
        id: EntityId,
    ) -> ServiceResult<Vec<EntitySummary>> {
        self.aggregation.get_children(user_id, category, id).await
    }
}

/// Trims the name and rejects it if blank. Blank notes and addresses become
/// `None`.
fn normalized(mut fields: EntityFields) -> ServiceResult<EntityFields> {
    let name = fields.name.trim();
    if name.is_empty() {
        return Err(ServiceError::ValidationFailed(
            "name must not be empty".to_string(),
        ));
    }
    fields.name = name.to_string();
    fields.notes = fields.notes.filter(|n| !n.trim().is_empty());
    fields.address = fields.address.filter(|a| !a.trim().is_empty());
    Ok(fields)
}
