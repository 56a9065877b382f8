use super::Dialect;
use crate::Result;
use crate::request::PageRequest;

/// `SELECT SKIP start FIRST size * FROM (..)`.
#[derive(Debug, Default, Clone, Copy)]
pub struct InformixDialect;

impl Dialect for InformixDialect {
   fn name(&self) -> &'static str {
      "informix"
   }

   fn limit_sql(&self, sql: &str, request: &PageRequest) -> Result<String> {
      let mut out = String::from("SELECT");
      if request.start_row() > 0 {
         out.push_str(&format!(" SKIP {}", request.start_row()));
      }
      if request.page_size() > 0 {
         out.push_str(&format!(" FIRST {}", request.page_size()));
      }
      out.push_str(&format!(" * FROM ( {sql} ) TEMP_T"));
      Ok(out)
   }
}
