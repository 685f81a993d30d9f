//! Cache-consistency coordination.
//!
//! ## Summary
//! Listings, counts and parent lookups are cached per user. Every mutation
//! for a user drops all of that user's cached listings, counts and parent
//! lookups, so a read after a write never sees the pre-write state.

pub mod coordinator;
pub mod invalidation;
pub mod key;

pub use coordinator::CacheCoordinator;
pub use invalidation::{Invalidation, PatternInvalidation};
