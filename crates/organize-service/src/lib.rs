pub mod aggregate;
pub mod cache;
pub mod deletion;
pub mod error;
pub mod hierarchy;
pub mod inventory;
pub mod query;
pub mod request;

pub use inventory::{InventoryService, ServiceOptions};
