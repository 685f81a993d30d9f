//! Per-category persistence of inventory entities.
//!
//! ## Summary
//! [`EntityStore`] is the seam between the service layer and storage. Every
//! operation is scoped to the owning user and ignores soft-deleted rows.
//! Hierarchy legality is decided by the caller; the store only guarantees
//! that a referenced parent is live at the moment of the write.

use futures::future::BoxFuture;

use organize_core::category::Category;
use organize_core::model::{
    Entity, EntityFields, EntityId, EntitySearch, EntitySummary, ListQuery, ParentCandidate,
    ParentRef,
};

use crate::error::StoreResult;

pub mod memory;
pub mod pg;

pub use memory::MemoryEntityStore;
pub use pg::PgEntityStore;

pub trait EntityStore: Send + Sync {
    /// Inserts a row and returns its id. Fails `ParentNotFound` if the parent
    /// is no longer live when the row is written.
    fn create<'a>(
        &'a self,
        user_id: &'a str,
        category: Category,
        fields: &'a EntityFields,
    ) -> BoxFuture<'a, StoreResult<EntityId>>;

    fn get_one<'a>(
        &'a self,
        user_id: &'a str,
        category: Category,
        id: EntityId,
    ) -> BoxFuture<'a, StoreResult<Entity>>;

    /// Full-field overwrite. Fails `NotFound` under the same conditions as
    /// [`EntityStore::get_one`].
    fn update<'a>(
        &'a self,
        user_id: &'a str,
        category: Category,
        id: EntityId,
        fields: &'a EntityFields,
    ) -> BoxFuture<'a, StoreResult<Entity>>;

    /// Marks a row deleted. Re-counts live children in `child_categories`
    /// atomically with the write and refuses with `HasChildren` if any exist.
    fn soft_delete<'a>(
        &'a self,
        user_id: &'a str,
        category: Category,
        id: EntityId,
        child_categories: &'a [Category],
    ) -> BoxFuture<'a, StoreResult<()>>;

    fn count_children<'a>(
        &'a self,
        user_id: &'a str,
        parent: ParentRef,
        child_categories: &'a [Category],
    ) -> BoxFuture<'a, StoreResult<i64>>;

    /// One window of the aggregated listing, without ancestry trails.
    fn list_entities<'a>(
        &'a self,
        user_id: &'a str,
        query: &'a ListQuery,
    ) -> BoxFuture<'a, StoreResult<Vec<EntitySummary>>>;

    fn count_entities<'a>(
        &'a self,
        user_id: &'a str,
        search: &'a EntitySearch,
    ) -> BoxFuture<'a, StoreResult<i64>>;

    fn parent_candidates<'a>(
        &'a self,
        user_id: &'a str,
        categories: &'a [Category],
    ) -> BoxFuture<'a, StoreResult<Vec<ParentCandidate>>>;

    fn children<'a>(
        &'a self,
        user_id: &'a str,
        parent: ParentRef,
        child_categories: &'a [Category],
    ) -> BoxFuture<'a, StoreResult<Vec<EntitySummary>>>;
}
