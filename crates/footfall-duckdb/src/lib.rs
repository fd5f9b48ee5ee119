pub mod backend;
pub mod queries;
pub mod schema;
pub mod visit_impl;

pub use backend::DuckDbBackend;

/// Re-export the `duckdb` crate so tests can inspect the catalog without an
/// extra dependency.
pub use duckdb;
