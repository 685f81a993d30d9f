//! Refuses to delete entities that still contain something.

use std::sync::Arc;

use organize_core::category::Category;
use organize_core::model::{EntityId, ParentRef};
use organize_db::store::EntityStore;

use crate::error::{ServiceError, ServiceResult};

pub struct DeletionGuard {
    store: Arc<dyn EntityStore>,
}

impl DeletionGuard {
    #[must_use]
    pub fn new(store: Arc<dyn EntityStore>) -> Self {
        Self { store }
    }

    /// ## Summary
    /// Checks that the entity exists and has no live children in any deeper
    /// category, whatever the current parent rules allow.
    ///
    /// ## Errors
    /// `NotFound` for a missing, foreign or already-deleted entity, then
    /// `HasChildren` if any child remains.
    #[tracing::instrument(skip(self))]
    pub async fn can_delete(
        &self,
        user_id: &str,
        category: Category,
        id: EntityId,
    ) -> ServiceResult<()> {
        self.store.get_one(user_id, category, id).await?;

        let child_categories = category.deeper_categories();
        let count = self
            .store
            .count_children(user_id, ParentRef::new(id, category), &child_categories)
            .await?;

        if count > 0 {
            return Err(ServiceError::HasChildren {
                category,
                id,
                count,
            });
        }
        Ok(())
    }

    /// ## Summary
    /// Soft-deletes the entity once [`DeletionGuard::can_delete`] passes. The
    /// store re-checks for children atomically with the write.
    ///
    /// ## Errors
    /// Same as [`DeletionGuard::can_delete`].
    pub async fn delete(&self, user_id: &str, category: Category, id: EntityId) -> ServiceResult<()> {
        self.can_delete(user_id, category, id).await?;

        let child_categories = category.deeper_categories();
        self.store
            .soft_delete(user_id, category, id, &child_categories)
            .await?;
        Ok(())
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
        parent: Option<ParentRef>,
    ) -> ParentRef {
        let fields = EntityFields {
            name: category.as_str().to_string(),
            parent,
            ..EntityFields::default()
        };
        let id = store.create("u1", category, &fields).await.unwrap();
        ParentRef::new(id, category)
    }

    #[test_log::test(tokio::test)]
    async fn test_guard_refuses_until_children_are_gone() {
        let store = Arc::new(MemoryEntityStore::new());
        let guard = DeletionGuard::new(store.clone());
        let room = create(&store, Category::Room, None).await;
        let item = create(&store, Category::Item, Some(room)).await;
        let bin = create(&store, Category::Container, Some(room)).await;

        assert!(matches!(
            guard.can_delete("u1", room.category, room.id).await,
            Err(ServiceError::HasChildren { count: 2, .. })
        ));

        guard.delete("u1", item.category, item.id).await.unwrap();
        guard.delete("u1", bin.category, bin.id).await.unwrap();
        assert!(guard.can_delete("u1", room.category, room.id).await.is_ok());
        guard.delete("u1", room.category, room.id).await.unwrap();

        assert!(matches!(
            guard.delete("u1", room.category, room.id).await,
            Err(ServiceError::NotFound { .. })
        ));
    }

    #[test_log::test(tokio::test)]
    async fn test_foreign_entity_is_not_found() {
        let store = Arc::new(MemoryEntityStore::new());
        let guard = DeletionGuard::new(store.clone());
        let room = create(&store, Category::Room, None).await;

        assert!(matches!(
            guard.can_delete("u2", room.category, room.id).await,
            Err(ServiceError::NotFound { .. })
        ));
    }
}
