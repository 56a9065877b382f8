use std::path::Path;
use std::sync::Arc;

use futures::future::BoxFuture;
use indexmap::IndexMap;
use pagehelper_core::{CacheKey, PageHelper, PageHelperBuilder, Row, Statement, StatementRunner};
use serde_json::Value as JsonValue;
use sqlx::sqlite::{SqliteArguments, SqliteConnectOptions, SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::{Column, Row as _, Sqlite};
use tracing::trace;

use crate::{Error, Result};

const DEFAULT_MAX_CONNECTIONS: u32 = 4;

type SqliteQuery<'a> = sqlx::query::Query<'a, Sqlite, SqliteArguments<'a>>;

/// [`StatementRunner`] over an sqlx SQLite pool.
///
/// Reports the product name `sqlite`, so a [`PageHelper`] built on it picks
/// the MySQL-style `LIMIT` dialect without configuration.
#[derive(Debug, Clone)]
pub struct SqliteRunner {
   pool: SqlitePool,
}

impl SqliteRunner {
   pub fn new(pool: SqlitePool) -> Self {
      Self { pool }
   }

   /// Open (creating if missing) the database file at `path`.
   pub async fn connect(path: impl AsRef<Path>) -> Result<Self> {
      let options = SqliteConnectOptions::new()
         .filename(path.as_ref())
         .create_if_missing(true);
      let pool = SqlitePoolOptions::new()
         .max_connections(DEFAULT_MAX_CONNECTIONS)
         .connect_with(options)
         .await?;
      Ok(Self { pool })
   }

   pub fn pool(&self) -> &SqlitePool {
      &self.pool
   }

   /// Builder for a [`PageHelper`] running on this pool.
   pub fn page_helper(self) -> PageHelperBuilder {
      PageHelper::builder(Arc::new(self))
   }

   /// Execute a statement that returns no rows.
   pub async fn execute(&self, query: &str, values: Vec<JsonValue>) -> Result<u64> {
      let result = bind_values(sqlx::query(query), values)
         .execute(&self.pool)
         .await?;
      Ok(result.rows_affected())
   }

   async fn fetch_all(&self, statement: &Statement) -> Result<Vec<Row>> {
      let rows = bind_values(sqlx::query(&statement.query), statement.values.clone())
         .fetch_all(&self.pool)
         .await?;
      rows.iter().map(decode_row).collect()
   }

   async fn fetch_total(&self, statement: &Statement) -> Result<i64> {
      let row = bind_values(sqlx::query(&statement.query), statement.values.clone())
         .fetch_optional(&self.pool)
         .await?
         .ok_or(Error::EmptyCount)?;
      Ok(row.try_get::<i64, _>(0)?)
   }
}

impl StatementRunner for SqliteRunner {
   fn fetch_rows<'a>(
      &'a self,
      statement: &'a Statement,
      key: &'a CacheKey,
   ) -> BoxFuture<'a, pagehelper_core::Result<Vec<Row>>> {
      Box::pin(async move {
         trace!(key = %key, "Fetching rows");
         self
            .fetch_all(statement)
            .await
            .map_err(pagehelper_core::Error::execution)
      })
   }

   fn fetch_count<'a>(
      &'a self,
      statement: &'a Statement,
      key: &'a CacheKey,
   ) -> BoxFuture<'a, pagehelper_core::Result<i64>> {
      Box::pin(async move {
         trace!(key = %key, "Fetching count");
         self
            .fetch_total(statement)
            .await
            .map_err(pagehelper_core::Error::execution)
      })
   }

   fn product_name(&self) -> Option<String> {
      Some("sqlite".to_string())
   }
}

fn decode_row(row: &SqliteRow) -> Result<Row> {
   let mut value = IndexMap::with_capacity(row.len());
   for (i, column) in row.columns().iter().enumerate() {
      let v = row.try_get_raw(i)?;
      let v = crate::decode::to_json(v)?;
      value.insert(column.name().to_string(), v);
   }
   Ok(value)
}

fn bind_values(mut query: SqliteQuery<'_>, values: Vec<JsonValue>) -> SqliteQuery<'_> {
   for value in values {
      query = bind_value(query, value);
   }
   query
}

/// Bind a JSON value with the closest SQLite storage class.
fn bind_value(query: SqliteQuery<'_>, value: JsonValue) -> SqliteQuery<'_> {
   match value {
      JsonValue::Null => query.bind(None::<JsonValue>),
      JsonValue::String(s) => query.bind(s),
      JsonValue::Bool(b) => query.bind(b),
      JsonValue::Number(number) => {
         // Preserve integer precision by binding as i64 when possible
         if let Some(int_val) = number.as_i64() {
            query.bind(int_val)
         } else if let Some(uint_val) = number.as_u64() {
            // Too large for i64, use f64 (will lose precision)
            query.bind(uint_val as f64)
         } else {
            query.bind(number.as_f64().unwrap_or_default())
         }
      }
      other => query.bind(other),
   }
}
