pub mod cache;
pub mod db;
pub mod error;
pub mod model;
pub mod store;
