use serde::{Deserialize, Serialize};

use crate::navigation::NavigationView;
use crate::page::Page;

/// Minimal `{ total, rows }` wrapper for API responses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultEnvelope<T> {
   pub total: i64,
   pub rows: Vec<T>,
}

impl<T> ResultEnvelope<T> {
   /// Envelope for an unpaginated list; the total is the row count.
   pub fn of(rows: Vec<T>) -> Self {
      Self {
         total: rows.len() as i64,
         rows,
      }
   }
}

impl<T> From<Page<T>> for ResultEnvelope<T> {
   fn from(page: Page<T>) -> Self {
      Self {
         total: page.total,
         rows: page.rows,
      }
   }
}

impl<T> From<NavigationView<T>> for ResultEnvelope<T> {
   fn from(view: NavigationView<T>) -> Self {
      Self {
         total: view.total,
         rows: view.rows,
      }
   }
}
