//! Database access helper.
//!
//! `Database` owns the session, `QueryExecutor` is the execution seam the
//! services depend on, and `shape` turns raw rows into typed records.

pub mod executor;
pub mod session;
pub mod shape;

pub use executor::{placeholders, QueryExecutor, SqlParam};
pub use session::Database;
pub use shape::{shape, shape_row};
