use super::Dialect;
use crate::Result;
use crate::request::PageRequest;

/// `LIMIT size` or `LIMIT start, size`. Also serves MariaDB, SQLite,
/// ClickHouse and HerdDB.
#[derive(Debug, Default, Clone, Copy)]
pub struct MySqlDialect;

impl Dialect for MySqlDialect {
   fn name(&self) -> &'static str {
      "mysql"
   }

   fn limit_sql(&self, sql: &str, request: &PageRequest) -> Result<String> {
      Ok(if request.start_row() == 0 {
         format!("{sql} LIMIT {}", request.page_size())
      } else {
         format!(
            "{sql} LIMIT {}, {}",
            request.start_row(),
            request.page_size()
         )
      })
   }
}
