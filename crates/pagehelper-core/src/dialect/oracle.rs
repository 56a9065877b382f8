use super::Dialect;
use crate::Result;
use crate::request::PageRequest;

const ROW_ID: &str = "PAGEHELPER_ROW_ID";

/// ROWNUM window for Oracle 12c and later. Also serves DM, EDB and Zenith.
#[derive(Debug, Default, Clone, Copy)]
pub struct OracleDialect;

impl Dialect for OracleDialect {
   fn name(&self) -> &'static str {
      "oracle"
   }

   fn limit_sql(&self, sql: &str, request: &PageRequest) -> Result<String> {
      Ok(format!(
         "SELECT * FROM ( SELECT TMP_PAGE.*, ROWNUM {ROW_ID} FROM ( {sql} ) TMP_PAGE) WHERE {ROW_ID} <= {} AND {ROW_ID} > {}",
         request.end_row(),
         request.start_row()
      ))
   }

   fn row_number_column(&self) -> Option<&'static str> {
      Some(ROW_ID)
   }
}

/// Oracle 9i variant: the upper bound sits inside the ROWNUM wrapper.
#[derive(Debug, Default, Clone, Copy)]
pub struct Oracle9iDialect;

impl Dialect for Oracle9iDialect {
   fn name(&self) -> &'static str {
      "oracle9i"
   }

   fn limit_sql(&self, sql: &str, request: &PageRequest) -> Result<String> {
      Ok(format!(
         "SELECT * FROM ( SELECT TMP_PAGE.*, ROWNUM {ROW_ID} FROM ( {sql} ) TMP_PAGE WHERE ROWNUM <= {} ) WHERE {ROW_ID} > {}",
         request.end_row(),
         request.start_row()
      ))
   }

   fn row_number_column(&self) -> Option<&'static str> {
      Some(ROW_ID)
   }
}
