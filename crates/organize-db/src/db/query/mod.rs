pub mod aggregate;
pub mod builder;
pub mod entity;
