//! # sqlx-pagehelper
//!
//! Count-then-page pagination for SQL queries, with a ready-made SQLite
//! runner on top of sqlx.
//!
//! The engine lives in [`pagehelper_core`] (re-exported as [`engine`]) and
//! works with any [`StatementRunner`]. This crate adds [`SqliteRunner`],
//! which binds JSON values, decodes rows to JSON (BLOBs as base64) and lets
//! the engine detect its dialect automatically.
//!
//! # Example
//!
//! ```no_run
//! use sqlx_pagehelper::{PageRequest, SqliteRunner, Statement};
//!
//! # async fn example() -> sqlx_pagehelper::Result<()> {
//! let helper = SqliteRunner::connect("blog.db").await?.page_helper().build()?;
//!
//! let page = helper
//!    .paginate(
//!       PageRequest::new(1, 20).with_order_by("published_at DESC")?,
//!       Statement::new("SELECT * FROM posts WHERE category = ?", vec!["rust".into()]),
//!    )
//!    .await?;
//!
//! println!("page {} of {}, {} posts in total", page.page_no, page.pages, page.total);
//! # Ok(())
//! # }
//! ```

mod decode;
mod error;
mod runner;

pub use error::{Error, Result};
pub use runner::SqliteRunner;

pub use pagehelper_core as engine;
pub use pagehelper_core::{
   ALL_ROWS, CacheKey, ContextToken, Dialect, DialectRegistry, NavigationView, Page, PageHelper,
   PageHelperBuilder, PageHelperConfig, PageRequest, QueryOutcome, ResultEnvelope, Row, RowBounds,
   Statement, StatementInterceptor, StatementKind, StatementRunner,
};
