//! Storage module for qbank.
//!
//! Provides the DuckDB-backed record store and the async handle that gates it
//! behind a ready lifecycle.

pub mod db;
pub mod handle;
pub mod models;
pub mod queries;
pub mod schema;

pub use db::{Database, StoreLocation};
pub use handle::StorageHandle;
pub use models::*;
