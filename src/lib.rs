// Library root — exposes internals for integration tests and future crate consumers.
// The binary entry point is src/main.rs.

pub mod agents;
pub mod cache;
pub mod config;
pub mod data;
pub mod docs;
pub mod error;
pub mod logger;
