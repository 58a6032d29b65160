//! Routes.

use axum::{routing::get, Router};

use crate::handlers;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::home))
        .route("/movies", get(handlers::movies))
        .route("/customers", get(handlers::customers))
}
