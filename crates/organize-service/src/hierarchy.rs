//! Parent legality checks for create and edit.

use std::sync::Arc;

use organize_core::category::{Category, HierarchyRules};
use organize_core::model::ParentRef;
use organize_db::error::StoreError;
use organize_db::store::EntityStore;

use crate::error::{ServiceError, ServiceResult};

pub struct HierarchyValidator {
    rules: Arc<HierarchyRules>,
    store: Arc<dyn EntityStore>,
}

impl HierarchyValidator {
    #[must_use]
    pub fn new(rules: Arc<HierarchyRules>, store: Arc<dyn EntityStore>) -> Self {
        Self { rules, store }
    }

    /// ## Summary
    /// Structural half of [`HierarchyValidator::validate`]. Never touches the
    /// store.
    ///
    /// ## Errors
    /// `InvalidParent` if a root entity names a parent or the parent category
    /// may not hold `category`; `ValidationFailed` if a non-root entity has no
    /// parent.
    pub fn check_structure(
        &self,
        category: Category,
        parent: Option<ParentRef>,
    ) -> ServiceResult<Option<ParentRef>> {
        match parent {
            Some(parent) if category.is_root() => Err(ServiceError::InvalidParent(format!(
                "{category} cannot have a parent, got {}",
                parent.category
            ))),
            None if category.is_root() => Ok(None),
            None => Err(ServiceError::ValidationFailed(format!(
                "{category} requires a parent id and parent category"
            ))),
            Some(parent) if !self.rules.is_legal_parent(category, parent.category) => {
                Err(ServiceError::InvalidParent(format!(
                    "{} cannot contain {category}",
                    parent.category
                )))
            }
            Some(parent) => Ok(Some(parent)),
        }
    }

    /// ## Summary
    /// Checks that `parent` is a legal, live parent owned by `user_id`.
    ///
    /// ## Errors
    /// Everything [`HierarchyValidator::check_structure`] returns, then
    /// `ParentNotFound` if the parent is missing, deleted or owned by another
    /// user.
    #[tracing::instrument(skip(self))]
    pub async fn validate(
        &self,
        user_id: &str,
        category: Category,
        parent: Option<ParentRef>,
    ) -> ServiceResult<()> {
        let Some(parent) = self.check_structure(category, parent)? else {
            return Ok(());
        };

        match self.store.get_one(user_id, parent.category, parent.id).await {
            Ok(_) => Ok(()),
            Err(StoreError::NotFound { category, id }) => {
                Err(ServiceError::ParentNotFound { category, id })
            }
            Err(err) => Err(err.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use organize_core::model::EntityFields;
    use organize_db::store::MemoryEntityStore;

    fn validator(store: Arc<MemoryEntityStore>) -> HierarchyValidator {
        HierarchyValidator::new(Arc::new(HierarchyRules::default()), store)
    }

    async fn building(store: &MemoryEntityStore, user_id: &str) -> ParentRef {
        let fields = EntityFields {
            name: "HQ".to_string(),
            ..EntityFields::default()
        };
        let id = store
            .create(user_id, Category::Building, &fields)
            .await
            .unwrap();
        ParentRef::new(id, Category::Building)
    }

    #[test_log::test(tokio::test)]
    async fn test_root_rejects_parent() {
        let store = Arc::new(MemoryEntityStore::new());
        let parent = building(&store, "u1").await;
        let validator = validator(store);

        assert!(matches!(
            validator.validate("u1", Category::Building, Some(parent)).await,
            Err(ServiceError::InvalidParent(_))
        ));
        assert!(validator.validate("u1", Category::Building, None).await.is_ok());
    }

    #[test_log::test(tokio::test)]
    async fn test_missing_parent_is_validation_failure() {
        let validator = validator(Arc::new(MemoryEntityStore::new()));
        assert!(matches!(
            validator.validate("u1", Category::Item, None).await,
            Err(ServiceError::ValidationFailed(_))
        ));
    }

    #[test_log::test(tokio::test)]
    async fn test_illegal_parent_checked_before_existence() {
        let validator = validator(Arc::new(MemoryEntityStore::new()));
        let phantom = ParentRef::new(999, Category::Building);
        assert!(matches!(
            validator.validate("u1", Category::Shelf, Some(phantom)).await,
            Err(ServiceError::InvalidParent(_))
        ));
    }

    #[test_log::test(tokio::test)]
    async fn test_every_legal_pair_depends_on_existence_and_owner() {
        let rules = HierarchyRules::default();
        for category in Category::ALL {
            for parent_category in rules.legal_parents(category) {
                let store = Arc::new(MemoryEntityStore::new());
                let validator = validator(store.clone());
                let missing = ParentRef::new(1, *parent_category);

                assert!(matches!(
                    validator.validate("u1", category, Some(missing)).await,
                    Err(ServiceError::ParentNotFound { .. })
                ));

                let parent = seed_chain(&store, "u1", *parent_category).await;
                assert!(validator.validate("u1", category, Some(parent)).await.is_ok());
                assert!(matches!(
                    validator.validate("u2", category, Some(parent)).await,
                    Err(ServiceError::ParentNotFound { .. })
                ));
            }
        }
    }

    #[test_log::test(tokio::test)]
    async fn test_every_illegal_pair_is_rejected() {
        let rules = HierarchyRules::default();
        let store = Arc::new(MemoryEntityStore::new());
        let validator = validator(store.clone());
        for category in Category::ALL.into_iter().filter(|c| !c.is_root()) {
            for parent_category in Category::ALL {
                if rules.is_legal_parent(category, parent_category) {
                    continue;
                }
                let parent = seed_chain(&store, "u1", parent_category).await;
                assert!(matches!(
                    validator.validate("u1", category, Some(parent)).await,
                    Err(ServiceError::InvalidParent(_))
                ));
            }
        }
    }

    /// Creates a live entity of `category` with a legal chain of ancestors.
    async fn seed_chain(store: &MemoryEntityStore, user_id: &str, category: Category) -> ParentRef {
        let mut parent = building(store, user_id).await;
        let path = [
            Category::Room,
            Category::ShelvingUnit,
            Category::Shelf,
            Category::Container,
            Category::Item,
        ];
        for step in path {
            if parent.category == category {
                break;
            }
            let fields = EntityFields {
                name: step.as_str().to_string(),
                parent: Some(parent),
                ..EntityFields::default()
            };
            let id = store.create(user_id, step, &fields).await.unwrap();
            parent = ParentRef::new(id, step);
        }
        parent
    }
}
