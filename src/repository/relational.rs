//! Relational store seam and its PostgreSQL implementation.
//!
//! The repository depends on the [`RelationalStore`] trait so the cache-aside
//! discipline is testable without a database. The PostgreSQL implementation
//! targets document-style tables (`id BIGSERIAL` + `data JSONB`): entities are
//! surfaced as their JSONB payload with the primary key merged in, filters
//! compare against payload fields, and updates are a JSONB merge.

use async_trait::async_trait;
use serde_json::Value;
use sqlx::PgPool;
use tracing::debug;

use super::QueryOptions;
use crate::error::{PrintgateError, Result};

/// Point lookups, list queries, and updates against the source of truth.
/// `fetch_by_id` distinguishes "not found" (`Ok(None)`) from every other
/// failure, which the repository needs to avoid caching negative results.
#[async_trait]
pub trait RelationalStore: Send + Sync {
    async fn fetch_by_id(&self, table: &str, id: i64) -> Result<Option<Value>>;

    async fn fetch_query(&self, table: &str, query: &QueryOptions) -> Result<Vec<Value>>;

    /// Merge `changes` into the row, returning the updated entity or `None`
    /// when the row does not exist
    async fn update(&self, table: &str, id: i64, changes: &Value) -> Result<Option<Value>>;

    /// Insert a new row, returning the stored entity with its assigned id
    async fn insert(&self, table: &str, data: &Value) -> Result<Value>;

    /// Delete a row, returning whether it existed
    async fn delete(&self, table: &str, id: i64) -> Result<bool>;
}

/// PostgreSQL implementation over an sqlx pool
pub struct PgRelationalStore {
    pool: PgPool,
}

impl PgRelationalStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Table and column names are interpolated into SQL, so they must be plain
/// identifiers. Handlers pass literals, but this guard keeps the invariant
/// independent of the call site.
fn check_identifier(name: &str) -> Result<()> {
    let mut chars = name.chars();
    let valid = match chars.next() {
        Some(first) => {
            (first.is_ascii_alphabetic() || first == '_')
                && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        None => false,
    };
    if valid {
        Ok(())
    } else {
        Err(PrintgateError::validation(format!(
            "invalid identifier: {name}"
        )))
    }
}

/// Filter values compare against `data->>'col'`, which is text. Strings bind
/// as-is; everything else binds as its JSON rendering.
fn filter_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[async_trait]
impl RelationalStore for PgRelationalStore {
    async fn fetch_by_id(&self, table: &str, id: i64) -> Result<Option<Value>> {
        check_identifier(table)?;
        let sql = format!(
            "SELECT data || jsonb_build_object('id', id) FROM {table} WHERE id = $1"
        );
        debug!(table = %table, id = id, "relational point lookup");

        let row: Option<Value> = sqlx::query_scalar(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    async fn fetch_query(&self, table: &str, query: &QueryOptions) -> Result<Vec<Value>> {
        check_identifier(table)?;

        let mut sql = format!("SELECT data || jsonb_build_object('id', id) FROM {table}");
        let mut binds: Vec<String> = Vec::new();

        if !query.filters.is_empty() {
            let mut clauses = Vec::new();
            for (column, value) in &query.filters {
                check_identifier(column)?;
                binds.push(filter_text(value));
                clauses.push(format!("data->>'{column}' = ${}", binds.len()));
            }
            sql.push_str(" WHERE ");
            sql.push_str(&clauses.join(" AND "));
        }

        if let Some((column, direction)) = &query.order_by {
            check_identifier(column)?;
            sql.push_str(&format!(" ORDER BY data->>'{column}' {}", direction.as_sql()));
        }
        if let Some(limit) = query.limit {
            sql.push_str(&format!(" LIMIT {limit}"));
        }
        if let Some(offset) = query.offset {
            sql.push_str(&format!(" OFFSET {offset}"));
        }

        debug!(table = %table, sql = %sql, "relational list query");

        let mut q = sqlx::query_scalar(&sql);
        for bind in &binds {
            q = q.bind(bind);
        }
        let rows: Vec<Value> = q.fetch_all(&self.pool).await?;
        Ok(rows)
    }

    async fn update(&self, table: &str, id: i64, changes: &Value) -> Result<Option<Value>> {
        check_identifier(table)?;
        if !changes.is_object() {
            return Err(PrintgateError::validation(
                "update payload must be a JSON object",
            ));
        }

        let sql = format!(
            "UPDATE {table} SET data = data || $1::jsonb WHERE id = $2 \
             RETURNING data || jsonb_build_object('id', id)"
        );
        debug!(table = %table, id = id, "relational update");

        let row: Option<Value> = sqlx::query_scalar(&sql)
            .bind(changes.to_string())
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    async fn insert(&self, table: &str, data: &Value) -> Result<Value> {
        check_identifier(table)?;
        if !data.is_object() {
            return Err(PrintgateError::validation(
                "insert payload must be a JSON object",
            ));
        }

        let sql = format!(
            "INSERT INTO {table} (data) VALUES ($1::jsonb) \
             RETURNING data || jsonb_build_object('id', id)"
        );
        debug!(table = %table, "relational insert");

        let row: Value = sqlx::query_scalar(&sql)
            .bind(data.to_string())
            .fetch_one(&self.pool)
            .await?;
        Ok(row)
    }

    async fn delete(&self, table: &str, id: i64) -> Result<bool> {
        check_identifier(table)?;
        let sql = format!("DELETE FROM {table} WHERE id = $1");
        debug!(table = %table, id = id, "relational delete");

        let result = sqlx::query(&sql).bind(id).execute(&self.pool).await?;
        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identifier_guard_rejects_injection_shapes() {
        assert!(check_identifier("products").is_ok());
        assert!(check_identifier("print_jobs").is_ok());
        assert!(check_identifier("products; DROP TABLE users").is_err());
        assert!(check_identifier("1products").is_err());
        assert!(check_identifier("").is_err());
        assert!(check_identifier("data->>'x'").is_err());
    }

    #[test]
    fn filter_text_strips_quotes_from_strings_only() {
        assert_eq!(filter_text(&Value::String("active".into())), "active");
        assert_eq!(filter_text(&serde_json::json!(42)), "42");
        assert_eq!(filter_text(&serde_json::json!(true)), "true");
    }
}
