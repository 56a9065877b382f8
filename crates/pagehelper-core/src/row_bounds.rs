use serde::{Deserialize, Serialize};

/// Offset and limit selection, the alternative to page number and size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowBounds {
   pub offset: i64,
   pub limit: i64,
   /// Overrides `row_bounds_with_count` from the engine configuration.
   #[serde(default)]
   pub count: Option<bool>,
}

impl RowBounds {
   pub const NO_ROW_OFFSET: i64 = 0;
   pub const NO_ROW_LIMIT: i64 = i32::MAX as i64;

   pub fn new(offset: i64, limit: i64) -> Self {
      Self {
         offset,
         limit,
         count: None,
      }
   }

   pub fn with_count(mut self, count: bool) -> Self {
      self.count = Some(count);
      self
   }

   /// True when the bounds select every row.
   pub fn is_unbounded(&self) -> bool {
      self.offset == Self::NO_ROW_OFFSET && self.limit == Self::NO_ROW_LIMIT
   }
}

impl Default for RowBounds {
   fn default() -> Self {
      Self::new(Self::NO_ROW_OFFSET, Self::NO_ROW_LIMIT)
   }
}
