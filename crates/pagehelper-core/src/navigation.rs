use serde::Serialize;

use crate::page::Page;

/// Presentation view of a page: 1-based display rows, neighbour pages and a
/// window of page numbers to render as links.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NavigationView<T> {
   pub page_no: i64,
   pub page_size: i64,
   /// Rows on this page.
   pub size: usize,
   /// 1-based position of the first row shown, 0 when the page is empty.
   pub start_row: i64,
   /// 1-based position of the last row shown, 0 when the page is empty.
   pub end_row: i64,
   pub total: i64,
   pub pages: i64,
   pub rows: Vec<T>,
   pub pre_page: Option<i64>,
   pub next_page: Option<i64>,
   pub is_first_page: bool,
   pub is_last_page: bool,
   pub has_previous_page: bool,
   pub has_next_page: bool,
   pub navigate_pages: i64,
   pub navigate_page_nums: Vec<i64>,
   pub navigate_first_page: Option<i64>,
   pub navigate_last_page: Option<i64>,
}

impl<T> NavigationView<T> {
   /// Build the view with a window of at most `navigate_pages` page numbers.
   pub fn new(page: Page<T>, navigate_pages: i64) -> Self {
      let size = page.rows.len();
      let (start_row, end_row) = if size == 0 {
         (0, 0)
      } else {
         let start = page.start_row + 1;
         (start, start + size as i64 - 1)
      };

      let mut view = Self {
         page_no: page.page_no,
         page_size: page.page_size,
         size,
         start_row,
         end_row,
         total: page.total,
         pages: page.pages,
         rows: page.rows,
         pre_page: None,
         next_page: None,
         is_first_page: false,
         is_last_page: false,
         has_previous_page: false,
         has_next_page: false,
         navigate_pages,
         navigate_page_nums: Vec::new(),
         navigate_first_page: None,
         navigate_last_page: None,
      };
      view.navigate_page_nums = window(view.page_no, view.pages, navigate_pages);
      view.navigate_first_page = view.navigate_page_nums.first().copied();
      view.navigate_last_page = view.navigate_page_nums.last().copied();
      view.calc_neighbours();
      view
   }

   /// View over a list that was not paginated: one page holding every row.
   pub fn from_rows(rows: Vec<T>, navigate_pages: i64) -> Self {
      let len = rows.len() as i64;
      Self::new(
         Page {
            page_no: 1,
            page_size: len,
            start_row: 0,
            end_row: len,
            total: len,
            pages: i64::from(len > 0),
            reasonable: false,
            page_size_zero: false,
            rows,
         },
         navigate_pages,
      )
   }

   /// Convert each row, keeping every navigation field.
   pub fn map<U>(self, f: impl FnMut(T) -> U) -> NavigationView<U> {
      NavigationView {
         page_no: self.page_no,
         page_size: self.page_size,
         size: self.size,
         start_row: self.start_row,
         end_row: self.end_row,
         total: self.total,
         pages: self.pages,
         rows: self.rows.into_iter().map(f).collect(),
         pre_page: self.pre_page,
         next_page: self.next_page,
         is_first_page: self.is_first_page,
         is_last_page: self.is_last_page,
         has_previous_page: self.has_previous_page,
         has_next_page: self.has_next_page,
         navigate_pages: self.navigate_pages,
         navigate_page_nums: self.navigate_page_nums,
         navigate_first_page: self.navigate_first_page,
         navigate_last_page: self.navigate_last_page,
      }
   }

   fn calc_neighbours(&mut self) {
      if self.page_no > 1 {
         self.pre_page = Some(self.page_no - 1);
      }
      if self.page_no < self.pages {
         self.next_page = Some(self.page_no + 1);
      }
      self.is_first_page = self.page_no == 1;
      self.is_last_page = self.page_no == self.pages || self.pages == 0;
      self.has_previous_page = self.page_no > 1;
      self.has_next_page = self.page_no < self.pages;
   }
}

/// Up to `width` consecutive page numbers centred on `current` and clamped
/// to `[1, pages]`.
fn window(current: i64, pages: i64, width: i64) -> Vec<i64> {
   if pages <= 0 || width <= 0 {
      return Vec::new();
   }
   if pages <= width {
      return (1..=pages).collect();
   }
   let mut start = current - width / 2;
   let mut end = current + width / 2;
   if start < 1 {
      start = 1;
      end = width;
   } else if end > pages {
      end = pages;
      start = pages - width + 1;
   } else {
      // Even widths centre one short on the right.
      end = start + width - 1;
   }
   (start..=end).collect()
}

#[cfg(test)]
mod tests {
   use super::*;
   use crate::request::PageRequest;

   fn page(page_no: i64, page_size: i64, total: i64) -> Page<i64> {
      let mut request = PageRequest::new(page_no, page_size);
      request.finalize_total(total);
      let first = request.start_row();
      let last = request.end_row().min(total);
      Page::new(&request, (first..last).collect())
   }

   #[test]
   fn window_shows_everything_when_few_pages() {
      let view = NavigationView::new(page(2, 10, 35), 8);
      assert_eq!(view.navigate_page_nums, vec![1, 2, 3, 4]);
      assert_eq!(view.navigate_first_page, Some(1));
      assert_eq!(view.navigate_last_page, Some(4));
   }

   #[test]
   fn window_centres_on_current() {
      let view = NavigationView::new(page(10, 10, 200), 8);
      assert_eq!(view.navigate_page_nums, vec![6, 7, 8, 9, 10, 11, 12, 13]);

      let view = NavigationView::new(page(10, 10, 200), 5);
      assert_eq!(view.navigate_page_nums, vec![8, 9, 10, 11, 12]);
   }

   #[test]
   fn window_clamps_at_edges() {
      let view = NavigationView::new(page(2, 10, 200), 8);
      assert_eq!(view.navigate_page_nums, vec![1, 2, 3, 4, 5, 6, 7, 8]);

      let view = NavigationView::new(page(19, 10, 200), 8);
      assert_eq!(view.navigate_page_nums, vec![13, 14, 15, 16, 17, 18, 19, 20]);
   }

   #[test]
   fn display_rows_are_one_based() {
      let view = NavigationView::new(page(3, 10, 25), 8);
      assert_eq!(view.size, 5);
      assert_eq!((view.start_row, view.end_row), (21, 25));
   }

   #[test]
   fn neighbours_and_edges() {
      let view = NavigationView::new(page(1, 10, 25), 8);
      assert!(view.is_first_page);
      assert!(!view.has_previous_page);
      assert_eq!(view.pre_page, None);
      assert_eq!(view.next_page, Some(2));

      let view = NavigationView::new(page(3, 10, 25), 8);
      assert!(view.is_last_page);
      assert!(!view.has_next_page);
      assert_eq!(view.pre_page, Some(2));
      assert_eq!(view.next_page, None);
   }

   #[test]
   fn empty_result() {
      let view = NavigationView::new(page(1, 10, 0), 8);
      assert_eq!(view.size, 0);
      assert_eq!((view.start_row, view.end_row), (0, 0));
      assert!(view.navigate_page_nums.is_empty());
      assert!(view.is_last_page);
      assert_eq!(view.navigate_first_page, None);
   }

   #[test]
   fn from_rows_is_single_page() {
      let view = NavigationView::from_rows(vec!["a", "b", "c"], 8);
      assert_eq!(view.total, 3);
      assert_eq!(view.pages, 1);
      assert_eq!((view.start_row, view.end_row), (1, 3));
      assert!(view.is_first_page && view.is_last_page);
      assert_eq!(view.navigate_page_nums, vec![1]);
   }

   #[test]
   fn map_keeps_navigation() {
      let view = NavigationView::new(page(2, 10, 35), 8).map(|n| n * 100);
      assert_eq!(view.rows[0], 1000);
      assert_eq!(view.navigate_page_nums, vec![1, 2, 3, 4]);
      assert_eq!(view.pre_page, Some(1));
   }
}
