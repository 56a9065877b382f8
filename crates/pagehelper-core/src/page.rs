use serde::{Deserialize, Serialize};

use crate::request::PageRequest;
use crate::statement::Row;

/// Rows of one page together with the request's finalized metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
   pub page_no: i64,
   pub page_size: i64,
   pub start_row: i64,
   pub end_row: i64,
   /// `-1` when no count was run.
   pub total: i64,
   pub pages: i64,
   pub reasonable: bool,
   pub page_size_zero: bool,
   pub rows: Vec<T>,
}

impl<T> Page<T> {
   pub fn new(request: &PageRequest, rows: Vec<T>) -> Self {
      Self {
         page_no: request.page_no(),
         page_size: request.page_size(),
         start_row: request.start_row(),
         end_row: request.end_row(),
         total: request.total(),
         pages: request.pages(),
         reasonable: request.is_reasonable(),
         page_size_zero: request.is_page_size_zero(),
         rows,
      }
   }

   /// Convert each row, keeping the metadata.
   pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
      Page {
         page_no: self.page_no,
         page_size: self.page_size,
         start_row: self.start_row,
         end_row: self.end_row,
         total: self.total,
         pages: self.pages,
         reasonable: self.reasonable,
         page_size_zero: self.page_size_zero,
         rows: self.rows.into_iter().map(f).collect(),
      }
   }

   pub fn len(&self) -> usize {
      self.rows.len()
   }

   pub fn is_empty(&self) -> bool {
      self.rows.is_empty()
   }

   pub fn into_rows(self) -> Vec<T> {
      self.rows
   }
}

/// Result of [`PageHelper::execute`](crate::PageHelper::execute): a page
/// when a request was attached, plain rows otherwise.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryOutcome {
   Rows(Vec<Row>),
   Page(Page<Row>),
}

impl QueryOutcome {
   pub fn rows(&self) -> &[Row] {
      match self {
         QueryOutcome::Rows(rows) => rows,
         QueryOutcome::Page(page) => &page.rows,
      }
   }

   pub fn into_rows(self) -> Vec<Row> {
      match self {
         QueryOutcome::Rows(rows) => rows,
         QueryOutcome::Page(page) => page.rows,
      }
   }

   pub fn page(&self) -> Option<&Page<Row>> {
      match self {
         QueryOutcome::Page(page) => Some(page),
         QueryOutcome::Rows(_) => None,
      }
   }

   pub fn into_page(self) -> Option<Page<Row>> {
      match self {
         QueryOutcome::Page(page) => Some(page),
         QueryOutcome::Rows(_) => None,
      }
   }
}

#[cfg(test)]
mod tests {
   use super::*;

   #[test]
   fn copies_request_metadata() {
      let mut request = PageRequest::new(2, 10);
      request.finalize_total(25);
      let page = Page::new(&request, vec![11, 12, 13]);

      assert_eq!(page.page_no, 2);
      assert_eq!(page.start_row, 10);
      assert_eq!(page.total, 25);
      assert_eq!(page.pages, 3);
      assert_eq!(page.len(), 3);
   }

   #[test]
   fn map_keeps_metadata() {
      let mut request = PageRequest::new(1, 2);
      request.finalize_total(9);
      let page = Page::new(&request, vec![1, 2]).map(|n| n.to_string());

      assert_eq!(page.rows, vec!["1".to_string(), "2".to_string()]);
      assert_eq!(page.pages, 5);
   }

   #[test]
   fn serializes_camel_case() {
      let page = Page::new(&PageRequest::new(1, 5), Vec::<i32>::new());
      let json = serde_json::to_value(&page).unwrap();
      assert_eq!(json["pageNo"], 1);
      assert_eq!(json["pageSizeZero"], false);
      assert!(json["rows"].as_array().unwrap().is_empty());
   }

   #[test]
   fn outcome_accessors() {
      let outcome = QueryOutcome::Rows(vec![Row::new()]);
      assert_eq!(outcome.rows().len(), 1);
      assert!(outcome.page().is_none());

      let outcome = QueryOutcome::Page(Page::new(&PageRequest::new(1, 5), vec![Row::new()]));
      assert!(outcome.page().is_some());
      assert_eq!(outcome.into_rows().len(), 1);
   }
}
