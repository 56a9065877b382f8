//! # pagehelper-sql
//!
//! Lexical SQL rewriting used by the pagination engine. Statements are never
//! parsed into a grammar tree; a byte-level scanner tracks string literals,
//! quoted identifiers, comments and parenthesis depth, which is enough to
//! locate the clauses pagination cares about.
//!
//! ## Operations
//!
//! - **[`count_sql`]**: derive a `SELECT COUNT(..)` statement from a query,
//!   dropping ORDER BY clauses that cannot change the count
//! - **[`replace_order_by`]**: swap (or add) the top-level ORDER BY
//! - **[`split_order_by`]**: detach the top-level ORDER BY for engines that
//!   need it inside a `ROW_NUMBER() OVER (..)` window
//! - **[`validate_page_base`]**: reject statements that already carry a
//!   top-level limiting clause
//!
//! ```
//! use pagehelper_sql::{CountOptions, count_sql};
//!
//! let sql = count_sql(
//!    "SELECT id, title FROM posts WHERE category = ? ORDER BY id",
//!    "0",
//!    CountOptions::default(),
//! )
//! .unwrap();
//! assert_eq!(sql, "SELECT COUNT(0) FROM posts WHERE category = ?");
//! ```

mod error;
mod rewrite;
mod scanner;

pub use error::{Result, SqlError};
pub use rewrite::{
   CountOptions, count_sql, has_bind_parameters, normalize, replace_order_by, split_order_by,
   top_level_limiting_clause, validate_page_base,
};
