use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

/// One result row: column name to value, in select-list order.
pub type Row = IndexMap<String, JsonValue>;

/// SQL text with positional bind values.
///
/// `id` names the statement so a hand-written count statement can be
/// registered for it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Statement {
   #[serde(default)]
   pub id: Option<String>,
   pub query: String,
   #[serde(default)]
   pub values: Vec<JsonValue>,
}

impl Statement {
   pub fn new(query: impl Into<String>, values: Vec<JsonValue>) -> Self {
      Self {
         id: None,
         query: query.into(),
         values,
      }
   }

   pub fn with_id(mut self, id: impl Into<String>) -> Self {
      self.id = Some(id.into());
      self
   }

   /// Same id and values, different text.
   pub(crate) fn rewritten(&self, query: String) -> Self {
      Self {
         id: self.id.clone(),
         query,
         values: self.values.clone(),
      }
   }
}

/// Identity of an executed statement for result caching.
///
/// Starts from the statement id, text and values; rewrites append the parts
/// that distinguish their output (count marker, ORDER BY, window).
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct CacheKey {
   parts: Vec<String>,
}

impl CacheKey {
   pub fn for_statement(statement: &Statement) -> Self {
      let mut key = Self::default();
      key.update(statement.id.as_deref().unwrap_or(""));
      key.update(&statement.query);
      for value in &statement.values {
         key.update(value);
      }
      key
   }

   pub fn update(&mut self, part: impl ToString) {
      self.parts.push(part.to_string());
   }

   pub fn parts(&self) -> &[String] {
      &self.parts
   }
}

impl fmt::Display for CacheKey {
   fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
      f.write_str(&self.parts.join(":"))
   }
}
