//! Shared building blocks for the film catalog services.
//!
//! - `config`: environment-driven application configuration
//! - `errors`: the error taxonomy and its HTTP mapping
//! - `db`: database session, query execution and row shaping
//! - `models`: field types, raw rows and shaped records
//! - `middleware`: request id and no-cache response headers

pub mod config;
pub mod db;
pub mod errors;
pub mod middleware;
pub mod models;

pub use errors::{AppError, AppResult};
