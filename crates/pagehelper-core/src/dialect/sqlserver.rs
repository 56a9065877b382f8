use pagehelper_sql::split_order_by;

use super::Dialect;
use crate::Result;
use crate::request::PageRequest;

const ROW_NUMBER: &str = "PAGE_ROW_NUMBER";

/// Ordering used when the statement has none; OFFSET and ROW_NUMBER both
/// require one.
const FALLBACK_ORDER: &str = "CURRENT_TIMESTAMP";

/// SQL Server 2005 to 2008: `ROW_NUMBER() OVER (ORDER BY ..)` window with
/// the statement's own ORDER BY moved into the window.
#[derive(Debug, Default, Clone, Copy)]
pub struct SqlServerDialect;

impl Dialect for SqlServerDialect {
   fn name(&self) -> &'static str {
      "sqlserver"
   }

   fn limit_sql(&self, sql: &str, request: &PageRequest) -> Result<String> {
      let (inner, order_by) = split_order_by(sql);
      let order_by = order_by.unwrap_or_else(|| FALLBACK_ORDER.to_string());
      Ok(format!(
         "SELECT TOP {} * FROM (SELECT ROW_NUMBER() OVER (ORDER BY {order_by}) {ROW_NUMBER}, * FROM ( {inner} ) AS PAGE_TABLE_ALIAS) AS PAGE_TABLE_ALIAS WHERE {ROW_NUMBER} > {} ORDER BY {ROW_NUMBER}",
         request.page_size(),
         request.start_row()
      ))
   }

   fn row_number_column(&self) -> Option<&'static str> {
      Some(ROW_NUMBER)
   }
}

/// SQL Server 2012 and later: `OFFSET .. ROWS FETCH NEXT .. ROWS ONLY`.
#[derive(Debug, Default, Clone, Copy)]
pub struct SqlServer2012Dialect;

impl Dialect for SqlServer2012Dialect {
   fn name(&self) -> &'static str {
      "sqlserver2012"
   }

   fn limit_sql(&self, sql: &str, request: &PageRequest) -> Result<String> {
      let ordered = match split_order_by(sql) {
         (_, Some(_)) => sql.to_string(),
         (_, None) => format!("{sql} ORDER BY {FALLBACK_ORDER}"),
      };
      Ok(offset_fetch_next(&ordered, request))
   }
}

/// Derby and Firebird: standard `OFFSET .. FETCH NEXT` with no ORDER BY
/// requirement.
#[derive(Debug, Default, Clone, Copy)]
pub struct OffsetFetchDialect;

impl Dialect for OffsetFetchDialect {
   fn name(&self) -> &'static str {
      "derby"
   }

   fn limit_sql(&self, sql: &str, request: &PageRequest) -> Result<String> {
      Ok(offset_fetch_next(sql, request))
   }
}

fn offset_fetch_next(sql: &str, request: &PageRequest) -> String {
   format!(
      "{sql} OFFSET {} ROWS FETCH NEXT {} ROWS ONLY",
      request.start_row(),
      request.page_size()
   )
}

#[cfg(test)]
mod tests {
   use super::*;

   #[test]
   fn row_number_moves_order_by_into_window() {
      let sql = SqlServerDialect
         .limit_sql("SELECT id, name FROM users ORDER BY name DESC", &PageRequest::new(3, 10))
         .unwrap();
      assert_eq!(
         sql,
         "SELECT TOP 10 * FROM (SELECT ROW_NUMBER() OVER (ORDER BY name DESC) PAGE_ROW_NUMBER, * FROM ( SELECT id, name FROM users ) AS PAGE_TABLE_ALIAS) AS PAGE_TABLE_ALIAS WHERE PAGE_ROW_NUMBER > 20 ORDER BY PAGE_ROW_NUMBER"
      );
   }

   #[test]
   fn row_number_without_order_by() {
      let sql = SqlServerDialect
         .limit_sql("SELECT * FROM users", &PageRequest::new(1, 5))
         .unwrap();
      assert!(sql.contains("OVER (ORDER BY CURRENT_TIMESTAMP)"));
      assert!(sql.contains("PAGE_ROW_NUMBER > 0"));
   }

   #[test]
   fn sqlserver2012_keeps_existing_order() {
      let sql = SqlServer2012Dialect
         .limit_sql("SELECT * FROM users ORDER BY id", &PageRequest::new(2, 25))
         .unwrap();
      assert_eq!(
         sql,
         "SELECT * FROM users ORDER BY id OFFSET 25 ROWS FETCH NEXT 25 ROWS ONLY"
      );
   }

   #[test]
   fn sqlserver2012_adds_fallback_order() {
      let sql = SqlServer2012Dialect
         .limit_sql("SELECT * FROM users", &PageRequest::new(1, 25))
         .unwrap();
      assert_eq!(
         sql,
         "SELECT * FROM users ORDER BY CURRENT_TIMESTAMP OFFSET 0 ROWS FETCH NEXT 25 ROWS ONLY"
      );
   }

   #[test]
   fn offset_fetch_plain() {
      let sql = OffsetFetchDialect
         .limit_sql("SELECT * FROM users", &PageRequest::new(2, 10))
         .unwrap();
      assert_eq!(sql, "SELECT * FROM users OFFSET 10 ROWS FETCH NEXT 10 ROWS ONLY");
   }
}
