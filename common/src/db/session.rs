//! MySQL session: owns the connection pool for the process lifetime.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use rust_decimal::Decimal;
use serde_json::{Number, Value};
use sqlx::mysql::{MySqlConnectOptions, MySqlPoolOptions, MySqlRow};
use sqlx::types::Json;
use sqlx::{Column, Decode, MySql, MySqlPool, Row, Type, TypeInfo};

use crate::config::DatabaseConfig;
use crate::db::executor::{QueryExecutor, SqlParam};
use crate::errors::{AppError, AppResult};
use crate::models::RawRow;

const DATE_FORMAT: &str = "%Y-%m-%d";
const TIME_FORMAT: &str = "%H:%M:%S";
const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// An open database session.
///
/// Cloning shares the same pool. Create one with `initialize` at startup,
/// hand it to the services that need it, and call `shutdown` once on exit.
#[derive(Clone)]
pub struct Database {
    pool: MySqlPool,
}

impl Database {
    /// Opens the pool and checks out a first connection.
    ///
    /// Any failure to reach the server is `AppError::DatabaseConnection`;
    /// there is no retry.
    pub async fn initialize(config: &DatabaseConfig) -> AppResult<Self> {
        config.check()?;

        let options = MySqlConnectOptions::new()
            .host(&config.host)
            .port(config.port)
            .username(&config.user)
            .password(&config.password)
            .database(&config.database);

        let pool = MySqlPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_secs(config.connect_timeout_secs))
            .connect_with(options)
            .await
            .map_err(|e| AppError::DatabaseConnection(e.to_string()))?;

        tracing::info!(
            host = %config.host,
            port = config.port,
            database = %config.database,
            max_connections = config.max_connections,
            "Database session established"
        );
        Ok(Self { pool })
    }

    /// Closes the pool, waiting for checked-out connections to come back.
    pub async fn shutdown(&self) {
        self.pool.close().await;
        tracing::info!("Database session released");
    }

    pub fn is_closed(&self) -> bool {
        self.pool.is_closed()
    }
}

#[async_trait]
impl QueryExecutor for Database {
    async fn execute(&self, sql: &str, params: &[SqlParam]) -> AppResult<Vec<RawRow>> {
        let mut query = sqlx::query(sql);
        for param in params {
            query = match param {
                SqlParam::Int(v) => query.bind(*v),
                SqlParam::UInt(v) => query.bind(*v),
            };
        }

        let rows = query
            .fetch_all(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseQuery(e.to_string()))?;

        tracing::debug!(rows = rows.len(), params = params.len(), "Query executed");
        rows.iter().map(decode_row).collect()
    }
}

/// How a column is decoded, derived from the MySQL type name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ColumnKind {
    Null,
    Integer,
    Float,
    Decimal,
    Date,
    Time,
    DateTime,
    Json,
    Text,
    Binary,
}

impl ColumnKind {
    /// Classifies a type name as reported by the driver, e.g.
    /// `INT UNSIGNED`, `DECIMAL`, `TIMESTAMP`, `MEDIUMTEXT`.
    fn from_type_name(name: &str) -> Self {
        let base = name.split_whitespace().next().unwrap_or_default();
        match base.to_ascii_uppercase().as_str() {
            "NULL" => ColumnKind::Null,
            "BOOLEAN" | "TINYINT" | "SMALLINT" | "MEDIUMINT" | "INT" | "BIGINT" | "YEAR"
            | "BIT" => ColumnKind::Integer,
            "FLOAT" | "DOUBLE" => ColumnKind::Float,
            "DECIMAL" => ColumnKind::Decimal,
            "DATE" => ColumnKind::Date,
            "TIME" => ColumnKind::Time,
            "DATETIME" | "TIMESTAMP" => ColumnKind::DateTime,
            "JSON" => ColumnKind::Json,
            "BINARY" | "VARBINARY" | "TINYBLOB" | "BLOB" | "MEDIUMBLOB" | "LONGBLOB"
            | "GEOMETRY" => ColumnKind::Binary,
            _ => ColumnKind::Text,
        }
    }
}

fn decode_row(row: &MySqlRow) -> AppResult<RawRow> {
    let mut raw = RawRow::new();
    for (idx, column) in row.columns().iter().enumerate() {
        raw.push(column.name(), decode_column(row, idx)?);
    }
    Ok(raw)
}

/// Decodes one column into a loosely typed value.
///
/// The column's type picks the decoder; when that fails the value is read
/// as text, then as bytes. Only a value that is neither is an error.
fn decode_column(row: &MySqlRow, idx: usize) -> AppResult<Value> {
    let column = &row.columns()[idx];
    let type_name = column.type_info().name();

    let decoded = match ColumnKind::from_type_name(type_name) {
        ColumnKind::Null => Ok(Value::Null),
        ColumnKind::Integer => decode_as::<i64, _>(row, idx, Value::from)
            .or_else(|_| decode_as::<u64, _>(row, idx, Value::from))
            .or_else(|_| decode_as::<u16, _>(row, idx, Value::from)),
        ColumnKind::Float => decode_as::<f64, _>(row, idx, float_value),
        ColumnKind::Decimal => decode_as::<Decimal, _>(row, idx, decimal_value),
        ColumnKind::Date => decode_as::<NaiveDate, _>(row, idx, date_value),
        ColumnKind::Time => decode_as::<NaiveTime, _>(row, idx, time_value),
        ColumnKind::DateTime => decode_as::<NaiveDateTime, _>(row, idx, datetime_value)
            .or_else(|_| {
                decode_as::<DateTime<Utc>, _>(row, idx, |v| datetime_value(v.naive_utc()))
            }),
        ColumnKind::Json => decode_as::<Json<Value>, _>(row, idx, |v| v.0),
        ColumnKind::Text => decode_as::<String, _>(row, idx, Value::String),
        ColumnKind::Binary => decode_as::<Vec<u8>, _>(row, idx, bytes_value),
    };

    decoded
        .or_else(|_| decode_as::<String, _>(row, idx, Value::String))
        .or_else(|_| decode_as::<Vec<u8>, _>(row, idx, bytes_value))
        .map_err(|e| {
            AppError::DatabaseQuery(format!(
                "column '{}' of type {} could not be decoded: {}",
                column.name(),
                type_name,
                e
            ))
        })
}

/// Reads a nullable column as `T` and converts it; NULL becomes `null`.
fn decode_as<'r, T, F>(row: &'r MySqlRow, idx: usize, convert: F) -> Result<Value, sqlx::Error>
where
    T: Decode<'r, MySql> + Type<MySql>,
    F: FnOnce(T) -> Value,
{
    Ok(row
        .try_get::<Option<T>, _>(idx)?
        .map(convert)
        .unwrap_or(Value::Null))
}

fn float_value(v: f64) -> Value {
    Number::from_f64(v).map(Value::Number).unwrap_or(Value::Null)
}

/// Exact decimals become JSON numbers; anything JSON cannot hold stays text.
fn decimal_value(v: Decimal) -> Value {
    let text = v.to_string();
    match text.parse::<Number>() {
        Ok(n) => Value::Number(n),
        Err(_) => Value::String(text),
    }
}

fn date_value(v: NaiveDate) -> Value {
    Value::String(v.format(DATE_FORMAT).to_string())
}

fn time_value(v: NaiveTime) -> Value {
    Value::String(v.format(TIME_FORMAT).to_string())
}

fn datetime_value(v: NaiveDateTime) -> Value {
    Value::String(v.format(DATETIME_FORMAT).to_string())
}

fn bytes_value(v: Vec<u8>) -> Value {
    Value::String(String::from_utf8_lossy(&v).into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_sakila_column_types_are_classified() {
        let cases = [
            ("SMALLINT UNSIGNED", ColumnKind::Integer),
            ("TINYINT UNSIGNED", ColumnKind::Integer),
            ("INT", ColumnKind::Integer),
            ("BIGINT", ColumnKind::Integer),
            ("BOOLEAN", ColumnKind::Integer),
            ("YEAR", ColumnKind::Integer),
            ("DECIMAL", ColumnKind::Decimal),
            ("DOUBLE", ColumnKind::Float),
            ("DATETIME", ColumnKind::DateTime),
            ("TIMESTAMP", ColumnKind::DateTime),
            ("DATE", ColumnKind::Date),
            ("TIME", ColumnKind::Time),
            ("JSON", ColumnKind::Json),
            ("VARCHAR", ColumnKind::Text),
            ("CHAR", ColumnKind::Text),
            ("TEXT", ColumnKind::Text),
            ("ENUM", ColumnKind::Text),
            ("SET", ColumnKind::Text),
            ("BLOB", ColumnKind::Binary),
            ("GEOMETRY", ColumnKind::Binary),
            ("NULL", ColumnKind::Null),
        ];
        for (name, kind) in cases {
            assert_eq!(ColumnKind::from_type_name(name), kind, "type {name}");
        }
    }

    #[test]
    fn test_unknown_type_falls_back_to_text() {
        assert_eq!(ColumnKind::from_type_name("VECTOR"), ColumnKind::Text);
        assert_eq!(ColumnKind::from_type_name(""), ColumnKind::Text);
    }

    #[test]
    fn test_decimal_becomes_number() {
        assert_eq!(decimal_value(Decimal::new(499, 2)), json!(4.99));
        assert_eq!(decimal_value(Decimal::new(67416, 0)), json!(67416));
        assert_eq!(decimal_value(Decimal::new(-150, 2)), json!(-1.5));
    }

    #[test]
    fn test_temporal_values_become_text() {
        let date = NaiveDate::from_ymd_opt(2005, 5, 24).unwrap();
        let time = NaiveTime::from_hms_opt(22, 53, 30).unwrap();

        assert_eq!(date_value(date), json!("2005-05-24"));
        assert_eq!(time_value(time), json!("22:53:30"));
        assert_eq!(
            datetime_value(NaiveDateTime::new(date, time)),
            json!("2005-05-24 22:53:30")
        );
    }

    #[test]
    fn test_non_finite_float_becomes_null() {
        assert_eq!(float_value(f64::NAN), Value::Null);
        assert_eq!(float_value(2.5), json!(2.5));
    }

    #[test]
    fn test_bytes_become_lossy_text() {
        assert_eq!(bytes_value(b"PENELOPE".to_vec()), json!("PENELOPE"));
        assert_eq!(bytes_value(vec![0x41, 0xff]), json!("A\u{fffd}"));
    }

    #[tokio::test]
    async fn test_invalid_config_is_rejected_before_connecting() {
        let config = DatabaseConfig {
            host: String::new(),
            ..Default::default()
        };
        let result = Database::initialize(&config).await;
        assert!(matches!(result, Err(AppError::Config(_))));
    }

    #[tokio::test]
    async fn test_unreachable_server_is_a_connection_error() {
        let config = DatabaseConfig {
            host: "127.0.0.1".into(),
            port: 1,
            connect_timeout_secs: 1,
            ..Default::default()
        };
        let result = Database::initialize(&config).await;
        assert!(matches!(result, Err(AppError::DatabaseConnection(_))));
    }

    // Integration tests require a sakila database
    // Run with: DB_HOST=... DB_USER=... DB_PASSWORD=... cargo test -p common -- --ignored

    #[tokio::test]
    #[ignore = "requires database"]
    async fn test_execute_binds_limit_and_decodes_rows() {
        let db = Database::initialize(&DatabaseConfig::from_env())
            .await
            .expect("connect failed");

        let rows = db
            .execute(
                "SELECT category_id, name FROM category ORDER BY category_id LIMIT ?",
                &[SqlParam::from(3u32)],
            )
            .await
            .expect("query failed");

        assert_eq!(rows.len(), 3);
        assert!(rows[0].get("category_id").is_some_and(Value::is_number));
        assert!(rows[0].get("name").is_some_and(Value::is_string));

        db.shutdown().await;
        assert!(db.is_closed());
    }

    #[tokio::test]
    #[ignore = "requires database"]
    async fn test_execute_decodes_decimal_and_temporal_columns() {
        let db = Database::initialize(&DatabaseConfig::from_env())
            .await
            .expect("connect failed");

        let rows = db
            .execute(
                "SELECT f.rental_rate, f.release_year, f.last_update, \
                        SUM(f.length) AS total_length, CURDATE() AS today \
                 FROM film f GROUP BY f.film_id ORDER BY f.film_id LIMIT ?",
                &[SqlParam::from(1u32)],
            )
            .await
            .expect("query failed");

        let row = &rows[0];
        assert!(row.get("rental_rate").is_some_and(Value::is_number));
        assert!(row.get("release_year").is_some_and(Value::is_number));
        assert!(row.get("last_update").is_some_and(Value::is_string));
        assert!(row.get("total_length").is_some_and(Value::is_number));
        assert!(row.get("today").is_some_and(Value::is_string));

        db.shutdown().await;
    }

    #[tokio::test]
    #[ignore = "requires database"]
    async fn test_bad_sql_is_a_query_error() {
        let db = Database::initialize(&DatabaseConfig::from_env())
            .await
            .expect("connect failed");

        let result = db.execute("SELECT * FORM film", &[]).await;
        assert!(matches!(result, Err(AppError::DatabaseQuery(_))));

        db.shutdown().await;
    }
}
