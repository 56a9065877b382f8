use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use serde_json::Value as JsonValue;
use sqlx::sqlite::SqliteValueRef;
use sqlx::{Decode, Sqlite, TypeInfo, ValueRef};

use crate::{Error, Result};

/// Convert a raw SQLite value to JSON.
///
/// Storage classes map directly: INTEGER to a number, REAL to a number (NaN
/// becomes null), TEXT to a string, BLOB to a base64 string.
pub(crate) fn to_json(value: SqliteValueRef<'_>) -> Result<JsonValue> {
   if value.is_null() {
      return Ok(JsonValue::Null);
   }

   let type_name = value.type_info().name().to_string();
   let json = match type_name.as_str() {
      "INTEGER" | "INT8" | "BIGINT" => JsonValue::from(decode::<i64>(value)?),
      "BOOLEAN" => JsonValue::Bool(decode::<bool>(value)?),
      "REAL" | "NUMERIC" => JsonValue::from(decode::<f64>(value)?),
      "TEXT" | "DATE" | "TIME" | "DATETIME" => JsonValue::String(decode::<String>(value)?),
      "BLOB" => JsonValue::String(STANDARD.encode(decode::<Vec<u8>>(value)?)),
      other => return Err(Error::UnsupportedDatatype(other.to_string())),
   };
   Ok(json)
}

fn decode<'r, T: Decode<'r, Sqlite>>(value: SqliteValueRef<'r>) -> Result<T> {
   T::decode(value).map_err(|e| Error::Sqlx(sqlx::Error::Decode(e)))
}
