//! Test doubles for the query executor.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use common::db::{QueryExecutor, SqlParam};
use common::errors::{AppError, AppResult};
use common::models::RawRow;

type Call = (String, Vec<SqlParam>);

/// Answers queries by matching a fragment of the SQL text and records every
/// call it receives.
#[derive(Clone, Default)]
pub struct FakeExecutor {
    rules: Arc<Vec<(String, Option<Vec<RawRow>>)>>,
    calls: Arc<Mutex<Vec<Call>>>,
}

impl FakeExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `rows` for any statement containing `fragment`.
    pub fn respond(self, fragment: &str, rows: Vec<RawRow>) -> Self {
        self.rule(fragment, Some(rows))
    }

    /// Fails any statement containing `fragment` with a query error.
    pub fn fail(self, fragment: &str) -> Self {
        self.rule(fragment, None)
    }

    fn rule(self, fragment: &str, answer: Option<Vec<RawRow>>) -> Self {
        let mut rules = (*self.rules).clone();
        rules.push((fragment.to_string(), answer));
        Self {
            rules: Arc::new(rules),
            calls: self.calls,
        }
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl QueryExecutor for FakeExecutor {
    async fn execute(&self, sql: &str, params: &[SqlParam]) -> AppResult<Vec<RawRow>> {
        self.calls
            .lock()
            .unwrap()
            .push((sql.to_string(), params.to_vec()));

        let rule = self
            .rules
            .iter()
            .find(|(fragment, _)| sql.contains(fragment.as_str()));
        match rule {
            Some((_, Some(rows))) => Ok(rows.clone()),
            Some((fragment, None)) => Err(AppError::DatabaseQuery(format!(
                "simulated failure for '{fragment}'"
            ))),
            None => Err(AppError::DatabaseQuery("no fake response configured".into())),
        }
    }
}

/// A film row as the movie queries return it.
pub fn film_row(n: u32) -> RawRow {
    RawRow::new()
        .with("title", format!("FILM {n}"))
        .with("release_year", 2006)
        .with("actors", "PENELOPE GUINESS, NICK WAHLBERG")
}

/// A customer row as the customer query returns it.
pub fn customer_row(id: u32, first_name: &str, last_name: &str) -> RawRow {
    RawRow::new()
        .with("customer_id", id)
        .with("first_name", first_name)
        .with("last_name", last_name)
}

/// A rental row as the batched rental query returns it.
pub fn rental_row(customer_id: u32, title: &str) -> RawRow {
    RawRow::new()
        .with("customer_id", customer_id)
        .with("title", title)
}
