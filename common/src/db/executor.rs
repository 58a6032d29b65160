//! Query execution seam.

use async_trait::async_trait;

use crate::errors::AppResult;
use crate::models::RawRow;

/// A value bound to a `?` placeholder.
///
/// Every bound value in this service is a limit or a row id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SqlParam {
    Int(i64),
    UInt(u64),
}

impl From<u32> for SqlParam {
    fn from(v: u32) -> Self {
        SqlParam::UInt(u64::from(v))
    }
}

/// Runs parameter-bound SQL and returns raw rows.
///
/// Statements are never built by string interpolation of values; every
/// caller-controlled value travels as a `SqlParam`.
#[async_trait]
pub trait QueryExecutor: Send + Sync {
    async fn execute(&self, sql: &str, params: &[SqlParam]) -> AppResult<Vec<RawRow>>;
}

/// Builds `?, ?, ?` for an `IN (...)` list of `count` bound values.
pub fn placeholders(count: usize) -> String {
    vec!["?"; count].join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_placeholders() {
        assert_eq!(placeholders(0), "");
        assert_eq!(placeholders(1), "?");
        assert_eq!(placeholders(3), "?, ?, ?");
    }

    #[test]
    fn test_limit_binds_as_unsigned() {
        assert_eq!(SqlParam::from(5u32), SqlParam::UInt(5));
        assert_eq!(SqlParam::from(u32::MAX), SqlParam::UInt(4_294_967_295));
    }
}
