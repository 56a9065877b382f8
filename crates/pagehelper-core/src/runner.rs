use futures::future::BoxFuture;

use crate::Result;
use crate::statement::{CacheKey, Row, Statement};

/// Execution layer the engine runs statements through.
///
/// Implementations own connections and drivers; the engine only hands them
/// finished SQL. Errors are returned as [`Error::Execution`](crate::Error::Execution)
/// and passed to the caller unchanged.
pub trait StatementRunner: Send + Sync {
   /// Run a row-returning statement.
   fn fetch_rows<'a>(
      &'a self,
      statement: &'a Statement,
      key: &'a CacheKey,
   ) -> BoxFuture<'a, Result<Vec<Row>>>;

   /// Run a count statement: a single row with a single integer column.
   fn fetch_count<'a>(&'a self, statement: &'a Statement, key: &'a CacheKey) -> BoxFuture<'a, Result<i64>>;

   /// Database product name used to detect a dialect, when known.
   fn product_name(&self) -> Option<String> {
      None
   }
}
