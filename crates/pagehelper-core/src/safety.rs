//! Injection denylist for caller-supplied ORDER BY and count-column text.

use std::sync::OnceLock;

use regex::Regex;

use crate::{Error, Result};

/// Default denylist: statement terminators, comment openers, string quotes,
/// and keywords that have no business inside a sort expression.
pub const DEFAULT_SQL_DENYLIST: &str = r"(?i)(;|--|/\*|\*/|'|\\|\b(select|insert|update|delete|drop|truncate|alter|create|grant|revoke|union|exec|execute|declare|sleep|benchmark|waitfor|shutdown|xp_\w+|sp_\w+)\b)";

/// Compiled denylist used to vet untrusted SQL fragments.
#[derive(Debug, Clone)]
pub struct SqlSafety {
   pattern: Regex,
}

impl SqlSafety {
   /// Compile a denylist pattern.
   pub fn new(pattern: &str) -> Result<Self> {
      Ok(Self {
         pattern: Regex::new(pattern)?,
      })
   }

   /// Shared instance built from [`DEFAULT_SQL_DENYLIST`].
   pub fn standard() -> &'static SqlSafety {
      static STANDARD: OnceLock<SqlSafety> = OnceLock::new();
      STANDARD.get_or_init(|| SqlSafety {
         pattern: Regex::new(DEFAULT_SQL_DENYLIST).expect("invalid default denylist"),
      })
   }

   /// Whether `text` matches the denylist.
   pub fn is_unsafe(&self, text: &str) -> bool {
      self.pattern.is_match(text)
   }

   pub fn check_order_by(&self, order_by: &str) -> Result<()> {
      if self.is_unsafe(order_by) {
         return Err(Error::InvalidOrderBy {
            order_by: order_by.to_string(),
         });
      }
      Ok(())
   }

   /// `*` and `0` are always accepted.
   pub fn check_count_column(&self, column: &str) -> Result<()> {
      if column == "*" || column == "0" {
         return Ok(());
      }
      if column.trim().is_empty() || self.is_unsafe(column) {
         return Err(Error::InvalidCountColumn {
            column: column.to_string(),
         });
      }
      Ok(())
   }
}

impl Default for SqlSafety {
   fn default() -> Self {
      Self::standard().clone()
   }
}
