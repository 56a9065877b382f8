use super::Dialect;
use crate::Result;
use crate::request::PageRequest;

const ROW_ID: &str = "PAGEHELPER_ROW_ID";

/// `ROWNUMBER() OVER()` window filtered with BETWEEN.
#[derive(Debug, Default, Clone, Copy)]
pub struct Db2Dialect;

impl Dialect for Db2Dialect {
   fn name(&self) -> &'static str {
      "db2"
   }

   fn limit_sql(&self, sql: &str, request: &PageRequest) -> Result<String> {
      Ok(format!(
         "SELECT * FROM (SELECT TMP_PAGE.*,ROWNUMBER() OVER() AS {ROW_ID} FROM ( {sql} ) AS TMP_PAGE) TMP_PAGE WHERE {ROW_ID} BETWEEN {} AND {}",
         request.start_row().saturating_add(1),
         request.end_row()
      ))
   }

   fn row_number_column(&self) -> Option<&'static str> {
      Some(ROW_ID)
   }
}

/// DB2 for i (AS/400): `OFFSET .. ROWS FETCH FIRST .. ROWS ONLY`.
#[derive(Debug, Default, Clone, Copy)]
pub struct As400Dialect;

impl Dialect for As400Dialect {
   fn name(&self) -> &'static str {
      "as400"
   }

   fn limit_sql(&self, sql: &str, request: &PageRequest) -> Result<String> {
      Ok(format!(
         "{sql} OFFSET {} ROWS FETCH FIRST {} ROWS ONLY",
         request.start_row(),
         request.page_size()
      ))
   }
}

#[cfg(test)]
mod tests {
   use super::*;

   #[test]
   fn db2_between_is_one_based() {
      let sql = Db2Dialect
         .limit_sql("SELECT * FROM staff", &PageRequest::new(3, 20))
         .unwrap();
      assert_eq!(
         sql,
         "SELECT * FROM (SELECT TMP_PAGE.*,ROWNUMBER() OVER() AS PAGEHELPER_ROW_ID FROM ( SELECT * FROM staff ) AS TMP_PAGE) TMP_PAGE WHERE PAGEHELPER_ROW_ID BETWEEN 41 AND 60"
      );
   }

   #[test]
   fn as400_fetch_first() {
      let sql = As400Dialect
         .limit_sql("SELECT * FROM staff", &PageRequest::new(1, 20))
         .unwrap();
      assert_eq!(sql, "SELECT * FROM staff OFFSET 0 ROWS FETCH FIRST 20 ROWS ONLY");
   }
}
