//! Per-engine pagination dialects.
//!
//! A [`Dialect`] drives one paginated execution through a fixed protocol:
//!
//! 1. [`skip`](Dialect::skip): bypass pagination entirely
//! 2. [`before_count`](Dialect::before_count) and
//!    [`count_statement`](Dialect::count_statement): derive the count
//! 3. [`after_count`](Dialect::after_count): record the total, decide
//!    whether the page query is worth running
//! 4. [`before_page`](Dialect::before_page) and
//!    [`page_statement`](Dialect::page_statement): derive the page query
//! 5. [`after_page`](Dialect::after_page): shape the returned rows
//! 6. [`after_all`](Dialect::after_all): always runs, even on failure
//!
//! Engines differ only in how a limiting clause is written, so most
//! implementations override [`limit_sql`](Dialect::limit_sql) and nothing
//! else.

use pagehelper_sql::{CountOptions, count_sql, normalize, replace_order_by, validate_page_base};

use crate::Result;
use crate::request::PageRequest;
use crate::statement::{CacheKey, Row, Statement};

mod db2;
mod informix;
mod mysql;
mod oracle;
mod postgres;
mod sqlserver;

pub use db2::{As400Dialect, Db2Dialect};
pub use informix::InformixDialect;
pub use mysql::MySqlDialect;
pub use oracle::{Oracle9iDialect, OracleDialect};
pub use postgres::{HsqldbDialect, PostgreSqlDialect};
pub use sqlserver::{OffsetFetchDialect, SqlServer2012Dialect, SqlServerDialect};

/// Engine-specific pagination behaviour.
///
/// A fresh instance is created for every execution, so implementations may
/// keep per-execution state in `self`.
pub trait Dialect: Send {
   /// Registered name, used in logs.
   fn name(&self) -> &'static str;

   /// Append or wrap `sql` with this engine's limiting clause for the
   /// request's row window.
   fn limit_sql(&self, sql: &str, request: &PageRequest) -> Result<String>;

   /// Synthetic column a row-number wrapper adds to every row.
   fn row_number_column(&self) -> Option<&'static str> {
      None
   }

   /// True when the statement should run without pagination.
   fn skip(&mut self, request: &PageRequest) -> bool {
      request.is_page_size_zero() && request.page_size() == 0 && !request.is_order_by_only()
   }

   fn before_count(&mut self, request: &PageRequest) -> bool {
      !request.is_order_by_only() && request.is_count()
   }

   fn count_statement(
      &mut self,
      statement: &Statement,
      request: &PageRequest,
      key: &mut CacheKey,
   ) -> Result<Statement> {
      let options = CountOptions {
         keep_order_by: request.keep_order_by(),
         keep_sub_select_order_by: request.keep_sub_select_order_by(),
      };
      let sql = count_sql(&statement.query, request.count_column(), options)?;
      key.update("count");
      Ok(statement.rewritten(sql))
   }

   /// Record `total` on the request. Returns false when the page query can
   /// be skipped because the requested window holds no rows.
   fn after_count(&mut self, total: i64, request: &mut PageRequest) -> bool {
      request.finalize_total(total);
      if request.page_size() < 0 {
         return false;
      }
      if !request.is_page_size_zero() && request.page_size() == 0 {
         return false;
      }
      request.page_no() > 0 && total > request.start_row()
   }

   fn before_page(&mut self, request: &PageRequest) -> bool {
      request.is_order_by_only() || request.page_size() > 0
   }

   fn page_statement(
      &mut self,
      statement: &Statement,
      request: &PageRequest,
      key: &mut CacheKey,
   ) -> Result<Statement> {
      let mut sql = normalize(&statement.query);
      if let Some(order_by) = request.order_by() {
         sql = replace_order_by(&sql, order_by)?;
         key.update(order_by);
      }
      if request.is_order_by_only() {
         return Ok(statement.rewritten(sql));
      }
      validate_page_base(&sql)?;
      let sql = self.limit_sql(&sql, request)?;
      key.update(request.start_row());
      key.update(request.page_size());
      Ok(statement.rewritten(sql))
   }

   /// Drop synthetic columns, trim to the page size and record a total for
   /// executions that did not count.
   fn after_page(&mut self, mut rows: Vec<Row>, request: &mut PageRequest) -> Vec<Row> {
      if let Some(column) = self.row_number_column() {
         for row in &mut rows {
            row.retain(|name, _| !name.eq_ignore_ascii_case(column));
         }
      }
      if !request.is_order_by_only()
         && request.page_size() > 0
         && rows.len() as i64 > request.page_size()
      {
         rows.truncate(request.page_size() as usize);
      }
      if request.is_order_by_only() {
         request.finalize_total(rows.len() as i64);
      } else if !request.is_count() {
         request.finalize_total(-1);
      } else if request.is_page_size_zero() && request.page_size() == 0 {
         request.finalize_total(rows.len() as i64);
      }
      rows
   }

   /// Release per-execution state. Runs exactly once per execution.
   fn after_all(&mut self) {}
}

/// `LIMIT size OFFSET start`, omitting the offset on the first page.
pub(crate) fn limit_offset(sql: &str, request: &PageRequest) -> String {
   if request.start_row() == 0 {
      format!("{sql} LIMIT {}", request.page_size())
   } else {
      format!(
         "{sql} LIMIT {} OFFSET {}",
         request.page_size(),
         request.start_row()
      )
   }
}

/// Built-in dialects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DialectKind {
   MySql,
   PostgreSql,
   Hsqldb,
   Oracle,
   Oracle9i,
   Db2,
   As400,
   Informix,
   SqlServer,
   SqlServer2012,
   OffsetFetch,
}

impl DialectKind {
   pub const ALL: [DialectKind; 11] = [
      DialectKind::MySql,
      DialectKind::PostgreSql,
      DialectKind::Hsqldb,
      DialectKind::Oracle,
      DialectKind::Oracle9i,
      DialectKind::Db2,
      DialectKind::As400,
      DialectKind::Informix,
      DialectKind::SqlServer,
      DialectKind::SqlServer2012,
      DialectKind::OffsetFetch,
   ];

   /// Names this dialect is registered under. The first is canonical.
   pub fn aliases(self) -> &'static [&'static str] {
      match self {
         DialectKind::MySql => &["mysql", "mariadb", "sqlite", "clickhouse", "herddb"],
         DialectKind::PostgreSql => &["postgresql", "kingbase", "kingbase8", "opengauss"],
         DialectKind::Hsqldb => &["hsqldb", "h2", "phoenix", "highgo", "xugu", "impala", "oscar"],
         DialectKind::Oracle => &["oracle", "dm", "edb", "zenith"],
         DialectKind::Oracle9i => &["oracle9i"],
         DialectKind::Db2 => &["db2"],
         DialectKind::As400 => &["as400"],
         DialectKind::Informix => &["informix", "informix-sqli"],
         DialectKind::SqlServer => &["sqlserver"],
         DialectKind::SqlServer2012 => &["sqlserver2012"],
         DialectKind::OffsetFetch => &["derby", "firebirdsql"],
      }
   }

   pub fn name(self) -> &'static str {
      self.aliases()[0]
   }

   pub fn create(self) -> Box<dyn Dialect> {
      match self {
         DialectKind::MySql => Box::new(MySqlDialect),
         DialectKind::PostgreSql => Box::new(PostgreSqlDialect),
         DialectKind::Hsqldb => Box::new(HsqldbDialect),
         DialectKind::Oracle => Box::new(OracleDialect),
         DialectKind::Oracle9i => Box::new(Oracle9iDialect),
         DialectKind::Db2 => Box::new(Db2Dialect),
         DialectKind::As400 => Box::new(As400Dialect),
         DialectKind::Informix => Box::new(InformixDialect),
         DialectKind::SqlServer => Box::new(SqlServerDialect),
         DialectKind::SqlServer2012 => Box::new(SqlServer2012Dialect),
         DialectKind::OffsetFetch => Box::new(OffsetFetchDialect),
      }
   }
}
