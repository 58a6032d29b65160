//! Page handlers.
//!
//! Each handler gathers its data, attaches the shared payload under `common`
//! and renders. Any failure aborts the whole page; `AppError` turns it into
//! a plain 500.

use axum::{extract::State, response::Html};
use serde::Serialize;
use serde_json::Value;

use common::errors::AppResult;

use crate::common_data::load_common_data;
use crate::service::PageService;
use crate::state::AppState;

/// Page data plus the shared payload.
#[derive(Serialize)]
struct ViewModel<T: Serialize> {
    #[serde(flatten)]
    data: T,
    common: Value,
}

async fn render_page<T: Serialize>(
    state: &AppState,
    page: &str,
    data: T,
) -> AppResult<Html<String>> {
    let common = load_common_data(&state.common_data_path).await?;
    let html = state.renderer.render(page, &ViewModel { data, common })?;
    tracing::debug!(page, bytes = html.len(), "Page rendered");
    Ok(Html(html))
}

/// `GET /`
pub async fn home(State(state): State<AppState>) -> AppResult<Html<String>> {
    let data = PageService::new(state.executor.clone()).home().await?;
    render_page(&state, "index", data).await
}

/// `GET /movies`
pub async fn movies(State(state): State<AppState>) -> AppResult<Html<String>> {
    let data = PageService::new(state.executor.clone()).movies().await?;
    render_page(&state, "movies", data).await
}

/// `GET /customers`
pub async fn customers(State(state): State<AppState>) -> AppResult<Html<String>> {
    let data = PageService::new(state.executor.clone()).customers().await?;
    render_page(&state, "customers", data).await
}
