use std::collections::HashMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::request::ParamNames;
use crate::safety::DEFAULT_SQL_DENYLIST;

/// Default multiplier applied to available parallelism when sizing the
/// count worker pool.
pub const DEFAULT_COUNT_WORKER_MULTIPLIER: usize = 2;

/// Default width of the page-number navigation window.
pub const DEFAULT_NAVIGATE_PAGES: i64 = 8;

/// Suffix appended to a statement id to look up a hand-written count
/// statement.
pub const DEFAULT_COUNT_SUFFIX: &str = "_COUNT";

/// Engine-wide pagination settings.
///
/// Per-request flags left unset on a [`PageRequest`](crate::PageRequest)
/// fall back to the values here.
///
/// # Example
///
/// ```
/// use pagehelper_core::PageHelperConfig;
///
/// let config: PageHelperConfig = serde_json::from_str(
///    r#"{ "helperDialect": "postgresql", "reasonable": true, "countTimeoutMs": 5000 }"#,
/// )
/// .unwrap();
/// assert_eq!(config.helper_dialect.as_deref(), Some("postgresql"));
/// assert_eq!(config.navigate_pages, 8);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PageHelperConfig {
   /// Dialect name used unless a request overrides it. When unset the
   /// dialect is detected from the execution layer's product name.
   pub helper_dialect: Option<String>,

   /// Detect the dialect on every execution instead of once at build time.
   pub auto_runtime_dialect: bool,

   pub reasonable: bool,

   pub page_size_zero: bool,

   /// Run the count concurrently with the page query by default.
   pub async_count: bool,

   /// Fixed size of the count worker pool. Defaults to available
   /// parallelism times `count_worker_multiplier`.
   pub count_workers: Option<usize>,

   pub count_worker_multiplier: usize,

   /// Upper bound on how long an asynchronous count may run once the page
   /// query has finished.
   pub count_timeout_ms: Option<u64>,

   pub navigate_pages: i64,

   /// Regex matched against untrusted ORDER BY and count-column text.
   pub sql_denylist: String,

   /// Treat a row-bounds offset as a page number instead of a row offset.
   pub offset_as_page_num: bool,

   /// Run a count for row-bounds selections.
   pub row_bounds_with_count: bool,

   /// Count flag for requests that do not set one.
   pub default_count: bool,

   pub keep_order_by: bool,

   pub keep_sub_select_order_by: bool,

   /// Extra dialect aliases: alias name to an already registered name.
   pub dialect_alias: HashMap<String, String>,

   pub count_suffix: String,

   /// Parameter names read by [`PageHelper::request_from_params`](crate::PageHelper::request_from_params).
   pub params: ParamNames,
}

impl Default for PageHelperConfig {
   fn default() -> Self {
      Self {
         helper_dialect: None,
         auto_runtime_dialect: false,
         reasonable: false,
         page_size_zero: false,
         async_count: false,
         count_workers: None,
         count_worker_multiplier: DEFAULT_COUNT_WORKER_MULTIPLIER,
         count_timeout_ms: None,
         navigate_pages: DEFAULT_NAVIGATE_PAGES,
         sql_denylist: DEFAULT_SQL_DENYLIST.to_string(),
         offset_as_page_num: false,
         row_bounds_with_count: false,
         default_count: true,
         keep_order_by: false,
         keep_sub_select_order_by: false,
         dialect_alias: HashMap::new(),
         count_suffix: DEFAULT_COUNT_SUFFIX.to_string(),
         params: ParamNames::default(),
      }
   }
}

impl PageHelperConfig {
   pub fn count_timeout(&self) -> Option<Duration> {
      self.count_timeout_ms.map(Duration::from_millis)
   }

   /// Number of concurrent count tasks the worker pool admits.
   pub fn count_pool_size(&self) -> usize {
      self
         .count_workers
         .unwrap_or_else(|| {
            let parallelism = std::thread::available_parallelism()
               .map(|n| n.get())
               .unwrap_or(1);
            parallelism * self.count_worker_multiplier
         })
         .max(1)
   }
}

#[cfg(test)]
mod tests {
   use super::*;

   #[test]
   fn defaults() {
      let config = PageHelperConfig::default();
      assert!(config.default_count);
      assert!(!config.async_count);
      assert_eq!(config.count_suffix, "_COUNT");
      assert_eq!(config.navigate_pages, 8);
      assert_eq!(config.count_timeout(), None);
      assert!(config.count_pool_size() >= 2);
   }

   #[test]
   fn explicit_worker_count_wins() {
      let config = PageHelperConfig {
         count_workers: Some(3),
         ..Default::default()
      };
      assert_eq!(config.count_pool_size(), 3);
   }

   #[test]
   fn zero_workers_still_admits_one() {
      let config = PageHelperConfig {
         count_workers: Some(0),
         ..Default::default()
      };
      assert_eq!(config.count_pool_size(), 1);
   }

   #[test]
   fn deserializes_partial_camel_case() {
      let config: PageHelperConfig = serde_json::from_str(
         r#"{
            "asyncCount": true,
            "countTimeoutMs": 1500,
            "dialectAlias": { "tidb": "mysql" },
            "params": { "pageNo": "page" }
         }"#,
      )
      .unwrap();

      assert!(config.async_count);
      assert_eq!(config.count_timeout(), Some(Duration::from_millis(1500)));
      assert_eq!(config.dialect_alias.get("tidb").map(String::as_str), Some("mysql"));
      assert_eq!(config.params.page_no, "page");
      assert_eq!(config.params.page_size, "pageSize");
      assert!(config.default_count);
   }
}
