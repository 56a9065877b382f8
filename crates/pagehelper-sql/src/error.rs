//! Error types for pagehelper-sql

/// Result type alias for rewrite operations.
pub type Result<T> = std::result::Result<T, SqlError>;

/// Errors raised when a statement cannot be decomposed into count/page form.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SqlError {
   /// Nothing left to rewrite after trimming whitespace and terminators.
   #[error("statement is empty")]
   EmptyStatement,

   /// The existing top-level ORDER BY references bind parameters, so it can
   /// be neither dropped nor replaced without shifting parameter positions.
   #[error("ORDER BY [{order_by}] contains bind parameters and cannot be rewritten")]
   OrderByHasParameters { order_by: String },

   /// The statement already carries a top-level LIMIT, OFFSET or FETCH
   /// clause, so a second limiting clause cannot be appended.
   #[error("statement already contains a top-level {clause} clause")]
   ExistingLimit { clause: String },
}

impl SqlError {
   /// Machine-readable error code.
   pub fn error_code(&self) -> &'static str {
      match self {
         SqlError::EmptyStatement => "EMPTY_STATEMENT",
         SqlError::OrderByHasParameters { .. } => "ORDER_BY_HAS_PARAMETERS",
         SqlError::ExistingLimit { .. } => "EXISTING_LIMIT",
      }
   }
}
