use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};

use crate::config::PageHelperConfig;
use crate::interceptor::{InterceptorChain, StatementInterceptor};
use crate::row_bounds::RowBounds;
use crate::safety::SqlSafety;
use crate::{Error, Result};

/// Page size that, together with page 1, means "every row".
pub const ALL_ROWS: i64 = i32::MAX as i64;

const DEFAULT_COUNT_COLUMN: &str = "0";

/// ORDER BY text attached to a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderBy {
   expression: String,
   trusted: bool,
}

impl OrderBy {
   pub fn expression(&self) -> &str {
      &self.expression
   }

   /// Set through `with_unsafe_order_by`; skips the denylist.
   pub fn is_trusted(&self) -> bool {
      self.trusted
   }
}

/// Pagination parameters for one query, plus the totals written back once
/// the count has run.
///
/// `start_row` and `end_row` are always derived from `page_no` and
/// `page_size`; every setter that touches either recomputes them. Flags that
/// are left unset fall back to [`PageHelperConfig`] when the request is
/// executed.
///
/// ```
/// use pagehelper_core::PageRequest;
///
/// let request = PageRequest::new(3, 10).with_order_by("id DESC").unwrap();
/// assert_eq!(request.start_row(), 20);
/// assert_eq!(request.end_row(), 30);
/// assert_eq!(request.order_by(), Some("id DESC"));
/// ```
#[derive(Debug, Clone)]
pub struct PageRequest {
   page_no: i64,
   page_size: i64,
   start_row: i64,
   end_row: i64,
   total: i64,
   pages: i64,
   count: Option<bool>,
   reasonable: Option<bool>,
   page_size_zero: Option<bool>,
   async_count: Option<bool>,
   order_by: Option<OrderBy>,
   order_by_only: bool,
   count_column: Option<String>,
   dialect: Option<String>,
   keep_order_by: Option<bool>,
   keep_sub_select_order_by: Option<bool>,
   interceptors: InterceptorChain,
}

impl PageRequest {
   /// Request page `page_no` (1-based) of `page_size` rows.
   ///
   /// Page 1 with a size of `i32::MAX` (or `i64::MAX`) means "all rows":
   /// the size is recorded as zero and `page_size_zero` is switched on.
   pub fn new(page_no: i64, page_size: i64) -> Self {
      let mut request = Self {
         page_no: 0,
         page_size: 0,
         start_row: 0,
         end_row: 0,
         total: 0,
         pages: 0,
         count: None,
         reasonable: None,
         page_size_zero: None,
         async_count: None,
         order_by: None,
         order_by_only: false,
         count_column: None,
         dialect: None,
         keep_order_by: None,
         keep_sub_select_order_by: None,
         interceptors: InterceptorChain::default(),
      };
      request.set_page(page_no, page_size);
      request
   }

   /// Sort-only request: the ORDER BY is applied, nothing is counted and no
   /// limiting clause is added.
   pub fn order_by_only(order_by: impl Into<String>) -> Result<Self> {
      let mut request = Self::new(0, 0).with_count(false).with_order_by(order_by)?;
      request.order_by_only = true;
      Ok(request)
   }

   /// Build a request from a row offset and limit.
   ///
   /// Offset 0 with the "no limit" sentinel means every row. Otherwise the
   /// page number is `ceil((offset + limit) / limit)` while the row window
   /// stays exactly `[offset, offset + limit)`.
   pub fn from_row_bounds(bounds: &RowBounds) -> Self {
      let mut request = Self::new(1, 0);
      request.reasonable = Some(false);
      if bounds.offset == RowBounds::NO_ROW_OFFSET && bounds.limit == RowBounds::NO_ROW_LIMIT {
         request.page_size_zero = Some(true);
         request.page_no = 1;
         request.page_size = 0;
         request.start_row = 0;
         request.end_row = 0;
         return request;
      }
      let offset = bounds.offset.max(0);
      let limit = bounds.limit.max(0);
      request.page_size = limit;
      request.page_no = if limit > 0 {
         offset / limit + i64::from(offset % limit != 0) + 1
      } else {
         0
      };
      request.start_row = offset;
      request.end_row = offset.saturating_add(limit);
      request
   }

   /// Read a request from a map of named parameters.
   ///
   /// Returns `None` when neither a page number and size pair nor an ORDER BY
   /// is present. Numbers may be JSON numbers or numeric strings.
   pub fn from_params(params: &Map<String, JsonValue>, names: &ParamNames) -> Result<Option<Self>> {
      let order_by = params
         .get(&names.order_by)
         .and_then(JsonValue::as_str)
         .map(str::trim)
         .filter(|s| !s.is_empty());

      let page_no = read_i64(params, &names.page_no)?;
      let page_size = read_i64(params, &names.page_size)?;

      let mut request = match (page_no, page_size) {
         (Some(page_no), Some(page_size)) => {
            let mut request = Self::new(page_no, page_size);
            if let Some(order_by) = order_by {
               request = request.with_order_by(order_by)?;
            }
            request
         }
         _ => match order_by {
            Some(order_by) => return Self::order_by_only(order_by).map(Some),
            None => return Ok(None),
         },
      };

      if let Some(count) = read_bool(params, &names.count)? {
         request = request.with_count(count);
      }
      if let Some(reasonable) = read_bool(params, &names.reasonable)? {
         request = request.with_reasonable(reasonable);
      }
      if let Some(page_size_zero) = read_bool(params, &names.page_size_zero)? {
         request = request.with_page_size_zero(page_size_zero);
      }
      Ok(Some(request))
   }

   pub fn with_page(mut self, page_no: i64, page_size: i64) -> Self {
      self.set_page(page_no, page_size);
      self
   }

   pub fn with_count(mut self, count: bool) -> Self {
      self.count = Some(count);
      self
   }

   /// Reasonable mode clamps out-of-range page numbers into `[1, pages]`.
   pub fn with_reasonable(mut self, reasonable: bool) -> Self {
      self.set_reasonable(reasonable);
      self
   }

   pub fn with_page_size_zero(mut self, page_size_zero: bool) -> Self {
      self.page_size_zero = Some(page_size_zero);
      self
   }

   /// Run the count concurrently with the page query.
   pub fn with_async_count(mut self, async_count: bool) -> Self {
      self.async_count = Some(async_count);
      self
   }

   /// Set the ORDER BY after vetting it against the default denylist. The
   /// engine re-checks it against its configured denylist before running.
   pub fn with_order_by(mut self, order_by: impl Into<String>) -> Result<Self> {
      let order_by = order_by.into();
      SqlSafety::standard().check_order_by(&order_by)?;
      self.order_by = Some(OrderBy {
         expression: order_by,
         trusted: false,
      });
      Ok(self)
   }

   /// Set the ORDER BY without any denylist check. Only for text that never
   /// comes from user input.
   pub fn with_unsafe_order_by(mut self, order_by: impl Into<String>) -> Self {
      self.order_by = Some(OrderBy {
         expression: order_by.into(),
         trusted: true,
      });
      self
   }

   pub fn with_order_by_only(mut self, order_by_only: bool) -> Self {
      self.order_by_only = order_by_only;
      self
   }

   /// Column counted by the generated count statement. `0` by default.
   pub fn with_count_column(mut self, column: impl Into<String>) -> Result<Self> {
      let column = column.into();
      SqlSafety::standard().check_count_column(&column)?;
      self.count_column = Some(column);
      Ok(self)
   }

   /// Use the named dialect for this request only.
   pub fn with_dialect(mut self, dialect: impl Into<String>) -> Self {
      self.dialect = Some(dialect.into());
      self
   }

   pub fn with_keep_order_by(mut self, keep: bool) -> Self {
      self.keep_order_by = Some(keep);
      self
   }

   pub fn with_keep_sub_select_order_by(mut self, keep: bool) -> Self {
      self.keep_sub_select_order_by = Some(keep);
      self
   }

   /// Interceptor that only runs for this request, after the engine-wide
   /// chain.
   pub fn with_interceptor(mut self, interceptor: impl StatementInterceptor + 'static) -> Self {
      self.interceptors.push(Arc::new(interceptor));
      self
   }

   /// Record the total row count and derive `pages`.
   ///
   /// A total of `-1` means "not counted" and sets `pages` to 1. In
   /// reasonable mode a page number past the last page is pulled back to it.
   pub fn finalize_total(&mut self, total: i64) {
      self.total = total;
      if total == -1 {
         self.pages = 1;
         return;
      }
      self.pages = if self.page_size > 0 {
         total / self.page_size + i64::from(total % self.page_size != 0)
      } else {
         0
      };
      if self.is_reasonable() && self.page_no > self.pages {
         if self.pages != 0 {
            self.page_no = self.pages;
         }
         self.calculate_rows();
      }
   }

   /// Fill unset flags from the engine configuration.
   pub(crate) fn apply_defaults(&mut self, config: &PageHelperConfig) {
      if self.count.is_none() {
         self.count = Some(config.default_count);
      }
      if self.reasonable.is_none() {
         self.set_reasonable(config.reasonable);
      }
      if self.page_size_zero.is_none() {
         self.page_size_zero = Some(config.page_size_zero);
      }
      if self.async_count.is_none() {
         self.async_count = Some(config.async_count);
      }
      if self.keep_order_by.is_none() {
         self.keep_order_by = Some(config.keep_order_by);
      }
      if self.keep_sub_select_order_by.is_none() {
         self.keep_sub_select_order_by = Some(config.keep_sub_select_order_by);
      }
   }

   /// Re-check untrusted text against the engine's denylist.
   pub(crate) fn validate(&self, safety: &SqlSafety) -> Result<()> {
      if let Some(order_by) = &self.order_by
         && !order_by.trusted
      {
         safety.check_order_by(&order_by.expression)?;
      }
      if let Some(column) = &self.count_column {
         safety.check_count_column(column)?;
      }
      Ok(())
   }

   fn set_page(&mut self, page_no: i64, page_size: i64) {
      if page_no == 1 && (page_size == ALL_ROWS || page_size == i64::MAX) {
         self.page_size_zero = Some(true);
         self.page_no = 1;
         self.page_size = 0;
      } else {
         self.page_no = page_no;
         self.page_size = page_size;
      }
      if self.is_reasonable() && self.page_no <= 0 {
         self.page_no = 1;
      }
      self.calculate_rows();
   }

   fn set_reasonable(&mut self, reasonable: bool) {
      self.reasonable = Some(reasonable);
      if reasonable && self.page_no <= 0 {
         self.page_no = 1;
         self.calculate_rows();
      }
   }

   fn calculate_rows(&mut self) {
      let size = self.page_size.max(0);
      self.start_row = if self.page_no > 0 {
         (self.page_no - 1).saturating_mul(size)
      } else {
         0
      };
      self.end_row = self
         .start_row
         .saturating_add(if self.page_no > 0 { size } else { 0 });
   }

   pub fn page_no(&self) -> i64 {
      self.page_no
   }

   pub fn page_size(&self) -> i64 {
      self.page_size
   }

   /// Zero-based offset of the first row on the page.
   pub fn start_row(&self) -> i64 {
      self.start_row
   }

   /// Exclusive offset one past the last row on the page.
   pub fn end_row(&self) -> i64 {
      self.end_row
   }

   /// Total matching rows, or `-1` when no count was run.
   pub fn total(&self) -> i64 {
      self.total
   }

   pub fn pages(&self) -> i64 {
      self.pages
   }

   pub fn is_count(&self) -> bool {
      self.count.unwrap_or(true)
   }

   pub fn is_reasonable(&self) -> bool {
      self.reasonable.unwrap_or(false)
   }

   pub fn is_page_size_zero(&self) -> bool {
      self.page_size_zero.unwrap_or(false)
   }

   pub fn is_async_count(&self) -> bool {
      self.async_count.unwrap_or(false)
   }

   pub fn order_by(&self) -> Option<&str> {
      self.order_by.as_ref().map(OrderBy::expression)
   }

   pub fn order_by_clause(&self) -> Option<&OrderBy> {
      self.order_by.as_ref()
   }

   pub fn is_order_by_only(&self) -> bool {
      self.order_by_only
   }

   pub fn count_column(&self) -> &str {
      self.count_column.as_deref().unwrap_or(DEFAULT_COUNT_COLUMN)
   }

   pub fn dialect(&self) -> Option<&str> {
      self.dialect.as_deref()
   }

   pub fn keep_order_by(&self) -> bool {
      self.keep_order_by.unwrap_or(false)
   }

   pub fn keep_sub_select_order_by(&self) -> bool {
      self.keep_sub_select_order_by.unwrap_or(false)
   }

   pub fn interceptors(&self) -> &InterceptorChain {
      &self.interceptors
   }
}

/// Names of the parameters read by [`PageRequest::from_params`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ParamNames {
   pub page_no: String,
   pub page_size: String,
   pub count: String,
   pub reasonable: String,
   pub page_size_zero: String,
   pub order_by: String,
}

impl Default for ParamNames {
   fn default() -> Self {
      Self {
         page_no: "pageNum".to_string(),
         page_size: "pageSize".to_string(),
         count: "count".to_string(),
         reasonable: "reasonable".to_string(),
         page_size_zero: "pageSizeZero".to_string(),
         order_by: "orderBy".to_string(),
      }
   }
}

fn invalid(name: &str, value: &JsonValue) -> Error {
   Error::InvalidParameter {
      name: name.to_string(),
      value: value.to_string(),
   }
}

/// Page numbers and sizes arrive as 32-bit integers; anything wider is
/// rejected rather than carried into the row window.
fn read_i64(params: &Map<String, JsonValue>, name: &str) -> Result<Option<i64>> {
   let value = match params.get(name) {
      None | Some(JsonValue::Null) => return Ok(None),
      Some(value) => value,
   };
   let parsed = match value {
      JsonValue::Number(n) => n.as_i64(),
      JsonValue::String(s) => s.trim().parse::<i64>().ok(),
      _ => None,
   };
   parsed
      .filter(|n| i32::try_from(*n).is_ok())
      .map(Some)
      .ok_or_else(|| invalid(name, value))
}

fn read_bool(params: &Map<String, JsonValue>, name: &str) -> Result<Option<bool>> {
   match params.get(name) {
      None | Some(JsonValue::Null) => Ok(None),
      Some(JsonValue::Bool(b)) => Ok(Some(*b)),
      Some(value @ JsonValue::String(s)) => match s.trim().to_ascii_lowercase().as_str() {
         "true" => Ok(Some(true)),
         "false" => Ok(Some(false)),
         _ => Err(invalid(name, value)),
      },
      Some(value) => Err(invalid(name, value)),
   }
}
