//! Handlebars page renderer.
//!
//! Page templates live at `<templates_dir>/<page>.hbs`. Every `.hbs` file in
//! `<templates_dir>/partials/` is registered as a partial named after its
//! file stem.

use std::path::Path;

use handlebars::{handlebars_helper, Handlebars};
use serde::Serialize;
use serde_json::Value;

use common::errors::{AppError, AppResult};

/// Pages the service renders.
pub const PAGES: [&str; 3] = ["index", "movies", "customers"];

const TEMPLATE_EXTENSION: &str = "hbs";

handlebars_helper!(eq: |a: Json, b: Json| loose_eq(a, b));
handlebars_helper!(gt: |a: Json, b: Json| greater_than(a, b));

/// Compiled templates and helpers, shared read-only across requests.
pub struct PageRenderer {
    registry: Handlebars<'static>,
}

impl PageRenderer {
    /// Compiles all pages and partials under `templates_dir`.
    pub fn load(templates_dir: &Path) -> AppResult<Self> {
        let mut registry = base_registry();

        let partials_dir = templates_dir.join("partials");
        if partials_dir.is_dir() {
            let entries = std::fs::read_dir(&partials_dir).map_err(|e| {
                AppError::Template(format!("{}: {}", partials_dir.display(), e))
            })?;
            for entry in entries {
                let path = entry
                    .map_err(|e| AppError::Template(e.to_string()))?
                    .path();
                if path.extension().and_then(|e| e.to_str()) != Some(TEMPLATE_EXTENSION) {
                    continue;
                }
                let Some(name) = path.file_stem().and_then(|s| s.to_str()) else {
                    continue;
                };
                let source = std::fs::read_to_string(&path)
                    .map_err(|e| AppError::Template(format!("{}: {}", path.display(), e)))?;
                registry
                    .register_partial(name, source)
                    .map_err(|e| AppError::Template(e.to_string()))?;
                tracing::debug!(partial = name, "Registered partial");
            }
        }

        for page in PAGES {
            let path = templates_dir.join(format!("{page}.{TEMPLATE_EXTENSION}"));
            registry
                .register_template_file(page, &path)
                .map_err(|e| AppError::Template(format!("{}: {}", path.display(), e)))?;
        }

        tracing::info!(dir = %templates_dir.display(), pages = PAGES.len(), "Templates loaded");
        Ok(Self { registry })
    }

    /// Renders a registered page with the given view-model.
    pub fn render<T: Serialize>(&self, page: &str, data: &T) -> AppResult<String> {
        self.registry
            .render(page, data)
            .map_err(|e| AppError::Template(e.to_string()))
    }
}

fn base_registry() -> Handlebars<'static> {
    let mut registry = Handlebars::new();
    registry.register_helper("eq", Box::new(eq));
    registry.register_helper("gt", Box::new(gt));
    registry
}

/// Equality where numbers and numeric text compare by value.
fn loose_eq(a: &Value, b: &Value) -> bool {
    match (as_number(a), as_number(b)) {
        (Some(x), Some(y)) if a.is_number() || b.is_number() => x == y,
        _ => a == b,
    }
}

/// Numeric comparison when either side is a number, otherwise
/// lexicographic for two strings. Anything else is not greater.
fn greater_than(a: &Value, b: &Value) -> bool {
    if a.is_number() || b.is_number() {
        return match (as_number(a), as_number(b)) {
            (Some(x), Some(y)) => x > y,
            _ => false,
        };
    }
    match (a, b) {
        (Value::String(x), Value::String(y)) => x > y,
        _ => false,
    }
}

fn as_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}
