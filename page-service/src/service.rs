//! Page data service.
//!
//! Issues the fixed catalog queries through the executor and shapes the
//! results into view-models. Queries within one page run strictly one after
//! another.

use std::collections::HashMap;
use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;

use common::db::{placeholders, shape, QueryExecutor, SqlParam};
use common::errors::AppResult;
use common::models::{FieldType, FieldTypeMap, ShapedRecord};

pub const HOME_MOVIE_LIMIT: u32 = 5;
pub const HOME_CATEGORY_LIMIT: u32 = 5;
pub const MOVIE_LIST_LIMIT: u32 = 15;
pub const CUSTOMER_LIMIT: u32 = 25;
pub const RENTALS_PER_CUSTOMER: usize = 5;

const MOVIES_SQL: &str = "\
    SELECT f.title, f.release_year,
           GROUP_CONCAT(CONCAT(a.first_name, ' ', a.last_name) SEPARATOR ', ') AS actors
    FROM film f
    JOIN film_actor fa ON fa.film_id = f.film_id
    JOIN actor a ON a.actor_id = fa.actor_id
    GROUP BY f.film_id
    ORDER BY f.film_id
    LIMIT ?";

const CATEGORIES_SQL: &str = "SELECT name FROM category ORDER BY category_id LIMIT ?";

const CUSTOMERS_SQL: &str = "\
    SELECT customer_id, first_name, last_name
    FROM customer
    ORDER BY customer_id
    LIMIT ?";

/// Rentals for a set of customers; `{ids}` is replaced by bound placeholders.
const RENTALS_SQL: &str = "\
    SELECT r.customer_id, f.title
    FROM rental r
    JOIN inventory i ON i.inventory_id = r.inventory_id
    JOIN film f ON f.film_id = i.film_id
    WHERE r.customer_id IN ({ids})
    ORDER BY r.customer_id, r.rental_id";

/// Home page data, before the shared payload is attached.
#[derive(Debug, Serialize)]
pub struct HomeData {
    pub movies: Vec<ShapedRecord>,
    pub categories: Vec<ShapedRecord>,
}

/// Movie list data.
#[derive(Debug, Serialize)]
pub struct MoviesData {
    pub movies: Vec<ShapedRecord>,
}

/// Customer list data; every customer carries a `rentals` list.
#[derive(Debug, Serialize)]
pub struct CustomersData {
    pub customers: Vec<ShapedRecord>,
}

fn movie_fields() -> FieldTypeMap {
    FieldTypeMap::new()
        .field("title", FieldType::String)
        .field("release_year", FieldType::Number)
        .field("actors", FieldType::String)
}

fn category_fields() -> FieldTypeMap {
    FieldTypeMap::new().field("name", FieldType::String)
}

fn customer_fields() -> FieldTypeMap {
    FieldTypeMap::new()
        .field("customer_id", FieldType::Number)
        .field("first_name", FieldType::String)
        .field("last_name", FieldType::String)
}

fn rental_fields() -> FieldTypeMap {
    FieldTypeMap::new()
        .field("customer_id", FieldType::Number)
        .field("title", FieldType::String)
}

/// Builds page data from the catalog.
pub struct PageService {
    executor: Arc<dyn QueryExecutor>,
}

impl PageService {
    pub fn new(executor: Arc<dyn QueryExecutor>) -> Self {
        Self { executor }
    }

    /// First films with their actors, plus the first categories.
    pub async fn home(&self) -> AppResult<HomeData> {
        let movies = self.movies_limited(HOME_MOVIE_LIMIT).await?;

        let rows = self
            .executor
            .execute(CATEGORIES_SQL, &[SqlParam::from(HOME_CATEGORY_LIMIT)])
            .await?;
        let categories = shape(&rows, &category_fields())?;

        Ok(HomeData { movies, categories })
    }

    /// The movie list page.
    pub async fn movies(&self) -> AppResult<MoviesData> {
        let movies = self.movies_limited(MOVIE_LIST_LIMIT).await?;
        Ok(MoviesData { movies })
    }

    /// Customers, each with their first rentals.
    ///
    /// Rentals for all customers come from one batched query and are grouped
    /// here, keeping query order and at most `RENTALS_PER_CUSTOMER` each.
    pub async fn customers(&self) -> AppResult<CustomersData> {
        let rows = self
            .executor
            .execute(CUSTOMERS_SQL, &[SqlParam::from(CUSTOMER_LIMIT)])
            .await?;
        let mut customers = shape(&rows, &customer_fields())?;

        let ids: Vec<SqlParam> = customers
            .iter()
            .filter_map(|c| c.get("customer_id").and_then(id_param))
            .collect();

        let mut rentals_by_customer: HashMap<String, Vec<Value>> = HashMap::new();
        if !ids.is_empty() {
            let sql = RENTALS_SQL.replace("{ids}", &placeholders(ids.len()));
            let rows = self.executor.execute(&sql, &ids).await?;

            for mut rental in shape(&rows, &rental_fields())? {
                let Some(customer_id) = rental.remove("customer_id") else {
                    continue;
                };
                let group = rentals_by_customer.entry(customer_id.to_string()).or_default();
                if group.len() < RENTALS_PER_CUSTOMER {
                    group.push(rental.into_value());
                }
            }
        }

        for customer in &mut customers {
            let rentals = customer
                .get("customer_id")
                .and_then(|id| rentals_by_customer.remove(&id.to_string()))
                .unwrap_or_default();
            customer.insert("rentals", Value::Array(rentals));
        }

        tracing::debug!(customers = customers.len(), "Customer page data assembled");
        Ok(CustomersData { customers })
    }

    async fn movies_limited(&self, limit: u32) -> AppResult<Vec<ShapedRecord>> {
        let rows = self
            .executor
            .execute(MOVIES_SQL, &[SqlParam::from(limit)])
            .await?;
        Ok(shape(&rows, &movie_fields())?)
    }
}

fn id_param(value: &Value) -> Option<SqlParam> {
    value
        .as_u64()
        .map(SqlParam::UInt)
        .or_else(|| value.as_i64().map(SqlParam::Int))
}
