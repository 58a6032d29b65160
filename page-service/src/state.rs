//! Application state for the page service.

use std::path::PathBuf;
use std::sync::Arc;

use common::config::AppConfig;
use common::db::QueryExecutor;

use crate::render::PageRenderer;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub executor: Arc<dyn QueryExecutor>,
    pub renderer: Arc<PageRenderer>,
    pub common_data_path: PathBuf,
}

impl AppState {
    /// Creates the state from an open session and a loaded renderer.
    pub fn new(
        config: &AppConfig,
        executor: Arc<dyn QueryExecutor>,
        renderer: PageRenderer,
    ) -> Self {
        Self {
            executor,
            renderer: Arc::new(renderer),
            common_data_path: config.common_data_path.clone(),
        }
    }
}
