//! Application error taxonomy.
//!
//! Every failure surfaces to the page as a 500 with a fixed plain-text body;
//! the underlying cause only goes to the log.

use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::models::ShapeError;

/// Body sent to clients for any failed page request.
pub const PAGE_ERROR_MESSAGE: &str = "Error querying the database";

/// Result alias used across the workspace.
pub type AppResult<T> = Result<T, AppError>;

#[derive(Debug, Error)]
pub enum AppError {
    /// The session could not be established at startup.
    #[error("database connection failed: {0}")]
    DatabaseConnection(String),

    /// A statement failed to execute or its rows could not be decoded.
    #[error("database query failed: {0}")]
    DatabaseQuery(String),

    /// Row values did not match the declared field types.
    #[error("type coercion failed: {0}")]
    TypeCoercion(#[from] ShapeError),

    #[error("invalid configuration: {0}")]
    Config(String),

    /// The shared page payload could not be read or parsed.
    #[error("static data unavailable: {0}")]
    StaticData(String),

    #[error("template error: {0}")]
    Template(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Short, stable label for structured logs.
    pub fn kind(&self) -> &'static str {
        match self {
            AppError::DatabaseConnection(_) => "database_connection",
            AppError::DatabaseQuery(_) => "database_query",
            AppError::TypeCoercion(_) => "type_coercion",
            AppError::Config(_) => "config",
            AppError::StaticData(_) => "static_data",
            AppError::Template(_) => "template",
            AppError::Internal(_) => "internal",
        }
    }
}

impl From<sqlx::Error> for AppError {
    fn from(e: sqlx::Error) -> Self {
        AppError::DatabaseQuery(e.to_string())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        tracing::error!(kind = self.kind(), error = %self, "Page request failed");
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
            PAGE_ERROR_MESSAGE,
        )
            .into_response()
    }
}
