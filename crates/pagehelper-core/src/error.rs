use std::time::Duration;

/// Result type alias for pagination operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Boxed error produced by an execution layer.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Error types for the pagination engine.
///
/// Execution-layer failures are carried unchanged in [`Error::Execution`];
/// the engine never retries or masks them.
#[derive(Debug, thiserror::Error)]
pub enum Error {
   /// ORDER BY text matched the injection denylist.
   #[error("order by [{order_by}] looks like SQL injection; use with_unsafe_order_by for trusted input")]
   InvalidOrderBy { order_by: String },

   /// Count column matched the injection denylist.
   #[error("count column [{column}] looks like SQL injection")]
   InvalidCountColumn { column: String },

   /// No dialect is registered under the requested or detected name.
   #[error("unsupported dialect: {0}")]
   UnsupportedDialect(String),

   /// No dialect was configured and the execution layer reported no
   /// product name to detect one from.
   #[error("no dialect configured and none could be detected from the execution layer")]
   DialectNotDetected,

   /// The statement could not be rewritten into count or page form.
   #[error(transparent)]
   Rewrite(#[from] pagehelper_sql::SqlError),

   /// Error returned by the execution layer, passed through unmodified.
   #[error("statement execution failed: {0}")]
   Execution(#[source] BoxError),

   /// The asynchronous count task panicked or was cancelled.
   #[error("count task failed: {0}")]
   CountTaskFailed(String),

   /// The asynchronous count did not finish within the configured timeout.
   #[error("count query did not finish within {0:?}")]
   CountTimeout(Duration),

   /// Context token is unknown or was already detached.
   #[error("invalid or detached context token")]
   InvalidContextToken,

   /// The configured denylist pattern does not compile.
   #[error("invalid sql denylist pattern: {0}")]
   InvalidDenylist(#[from] regex::Error),

   /// A pagination parameter could not be read as the expected type.
   #[error("invalid value for pagination parameter '{name}': {value}")]
   InvalidParameter { name: String, value: String },
}

impl Error {
   /// Wrap an execution-layer error.
   ///
   /// Used by runner implementations (e.g. the SQLite runner) to carry
   /// driver-specific errors through the engine.
   pub fn execution(err: impl std::error::Error + Send + Sync + 'static) -> Self {
      Error::Execution(Box::new(err))
   }

   /// Extract a structured error code from the error type.
   pub fn error_code(&self) -> String {
      match self {
         Error::InvalidOrderBy { .. } => "INVALID_ORDER_BY".to_string(),
         Error::InvalidCountColumn { .. } => "INVALID_COUNT_COLUMN".to_string(),
         Error::UnsupportedDialect(_) => "UNSUPPORTED_DIALECT".to_string(),
         Error::DialectNotDetected => "DIALECT_NOT_DETECTED".to_string(),
         Error::Rewrite(e) => e.error_code().to_string(),
         Error::Execution(_) => "EXECUTION_ERROR".to_string(),
         Error::CountTaskFailed(_) => "COUNT_TASK_FAILED".to_string(),
         Error::CountTimeout(_) => "COUNT_TIMEOUT".to_string(),
         Error::InvalidContextToken => "INVALID_CONTEXT_TOKEN".to_string(),
         Error::InvalidDenylist(_) => "INVALID_DENYLIST".to_string(),
         Error::InvalidParameter { .. } => "INVALID_PARAMETER".to_string(),
      }
   }

   /// Whether this is a validation failure on caller-supplied text.
   pub fn is_validation(&self) -> bool {
      matches!(
         self,
         Error::InvalidOrderBy { .. } | Error::InvalidCountColumn { .. }
      )
   }
}

#[cfg(test)]
mod tests {
   use super::*;

   #[test]
   fn test_error_code_invalid_order_by() {
      let err = Error::InvalidOrderBy {
         order_by: "id; DROP TABLE x".into(),
      };
      assert_eq!(err.error_code(), "INVALID_ORDER_BY");
      assert!(err.to_string().contains("id; DROP TABLE x"));
      assert!(err.is_validation());
   }

   #[test]
   fn test_error_code_invalid_count_column() {
      let err = Error::InvalidCountColumn {
         column: "id--".into(),
      };
      assert_eq!(err.error_code(), "INVALID_COUNT_COLUMN");
      assert!(err.is_validation());
   }

   #[test]
   fn test_error_code_unsupported_dialect() {
      let err = Error::UnsupportedDialect("cobol-db".into());
      assert_eq!(err.error_code(), "UNSUPPORTED_DIALECT");
      assert!(err.to_string().contains("cobol-db"));
      assert!(!err.is_validation());
   }

   #[test]
   fn test_error_code_rewrite_uses_sql_code() {
      let err = Error::from(pagehelper_sql::SqlError::EmptyStatement);
      assert_eq!(err.error_code(), "EMPTY_STATEMENT");
   }

   #[test]
   fn test_error_code_execution_keeps_source() {
      let err = Error::execution(std::io::Error::new(
         std::io::ErrorKind::ConnectionReset,
         "reset",
      ));
      assert_eq!(err.error_code(), "EXECUTION_ERROR");
      assert!(std::error::Error::source(&err).is_some());
   }

   #[test]
   fn test_error_code_count_timeout() {
      let err = Error::CountTimeout(Duration::from_millis(250));
      assert_eq!(err.error_code(), "COUNT_TIMEOUT");
      assert!(err.to_string().contains("250ms"));
   }

   #[test]
   fn test_error_code_invalid_context_token() {
      assert_eq!(
         Error::InvalidContextToken.error_code(),
         "INVALID_CONTEXT_TOKEN"
      );
   }
}
