//! # pagehelper-core
//!
//! Count-then-page query orchestration. Given a [`Statement`] and a
//! [`PageRequest`], the engine derives a count statement, runs it, and only
//! then runs the page statement rewritten for the target engine's
//! [`Dialect`]. Results come back as a [`Page`] carrying the finalized totals.
//!
//! The engine never talks to a database directly. Every statement goes
//! through a [`StatementRunner`] supplied by the caller.
//!
//! ## Features
//!
//! - **Built-in dialects**: MySQL, PostgreSQL, HSQLDB, Oracle, DB2,
//!   Informix, SQL Server and the OFFSET/FETCH family, each under several
//!   aliases, plus custom dialects via [`DialectRegistry`]
//! - **Asynchronous count**: the count can run on a bounded worker pool
//!   while the page query executes
//! - **Interceptors**: rewrite the original, count and page statements
//!   and their cache keys before they run
//! - **Injection checks**: ORDER BY and count-column text is vetted against
//!   a configurable denylist
//! - **Presentation helpers**: [`NavigationView`] and [`ResultEnvelope`]

mod config;
mod dialect;
mod envelope;
mod error;
mod helper;
mod interceptor;
mod navigation;
mod page;
mod registry;
mod request;
mod row_bounds;
mod runner;
mod safety;
mod statement;
mod worker;

pub use config::{
   DEFAULT_COUNT_SUFFIX, DEFAULT_COUNT_WORKER_MULTIPLIER, DEFAULT_NAVIGATE_PAGES, PageHelperConfig,
};
pub use dialect::{
   As400Dialect, Db2Dialect, Dialect, DialectKind, HsqldbDialect, InformixDialect, MySqlDialect,
   OffsetFetchDialect, Oracle9iDialect, OracleDialect, PostgreSqlDialect, SqlServer2012Dialect,
   SqlServerDialect,
};
pub use envelope::ResultEnvelope;
pub use error::{BoxError, Error, Result};
pub use helper::{ContextToken, PageHelper, PageHelperBuilder};
pub use interceptor::{InterceptorChain, StatementInterceptor, StatementKind};
pub use navigation::NavigationView;
pub use page::{Page, QueryOutcome};
pub use registry::{DialectFactory, DialectRegistry};
pub use request::{ALL_ROWS, OrderBy, PageRequest, ParamNames};
pub use row_bounds::RowBounds;
pub use runner::StatementRunner;
pub use safety::{DEFAULT_SQL_DENYLIST, SqlSafety};
pub use statement::{CacheKey, Row, Statement};

// Re-export for custom dialects that reuse the SQL helpers.
pub use pagehelper_sql as sql;
