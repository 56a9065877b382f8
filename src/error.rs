/// Result type alias for the SQLite runner.
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for the SQLite runner.
#[derive(Debug, thiserror::Error)]
pub enum Error {
   /// Error from SQLx operations.
   #[error(transparent)]
   Sqlx(#[from] sqlx::Error),

   /// Error from the pagination engine.
   #[error(transparent)]
   Page(#[from] pagehelper_core::Error),

   /// SQLite type that cannot be mapped to JSON.
   #[error("unsupported datatype: {0}")]
   UnsupportedDatatype(String),

   /// Count statement returned no row.
   #[error("count query returned no rows")]
   EmptyCount,
}

impl Error {
   /// Extract a structured error code from the error type.
   ///
   /// For SQLx database errors, returns the underlying SQLite error code
   /// when available (e.g. "SQLITE_CONSTRAINT", or the numeric code).
   pub fn error_code(&self) -> String {
      match self {
         Error::Sqlx(e) => {
            if let Some(db_err) = e.as_database_error()
               && let Some(code) = db_err.code()
            {
               return code.to_string();
            }
            "SQLX_ERROR".to_string()
         }
         Error::Page(e) => e.error_code(),
         Error::UnsupportedDatatype(_) => "UNSUPPORTED_DATATYPE".to_string(),
         Error::EmptyCount => "EMPTY_COUNT".to_string(),
      }
   }
}

#[cfg(test)]
mod tests {
   use super::*;

   #[test]
   fn test_error_code_unsupported_datatype() {
      let err = Error::UnsupportedDatatype("JSONB".into());
      assert_eq!(err.error_code(), "UNSUPPORTED_DATATYPE");
      assert!(err.to_string().contains("JSONB"));
   }

   #[test]
   fn test_error_code_page_passthrough() {
      let err = Error::from(pagehelper_core::Error::InvalidContextToken);
      assert_eq!(err.error_code(), "INVALID_CONTEXT_TOKEN");
   }

   #[test]
   fn test_error_code_sqlx_without_database_code() {
      let err = Error::from(sqlx::Error::RowNotFound);
      assert_eq!(err.error_code(), "SQLX_ERROR");
   }

   #[test]
   fn test_error_code_empty_count() {
      assert_eq!(Error::EmptyCount.error_code(), "EMPTY_COUNT");
   }
}
