use super::{Dialect, limit_offset};
use crate::Result;
use crate::request::PageRequest;

/// `LIMIT size OFFSET start`. Also serves Kingbase and openGauss.
#[derive(Debug, Default, Clone, Copy)]
pub struct PostgreSqlDialect;

impl Dialect for PostgreSqlDialect {
   fn name(&self) -> &'static str {
      "postgresql"
   }

   fn limit_sql(&self, sql: &str, request: &PageRequest) -> Result<String> {
      Ok(limit_offset(sql, request))
   }
}

/// HSQLDB family: H2, Phoenix, HighGo, Xugu, Impala and Oscar share the
/// PostgreSQL clause.
#[derive(Debug, Default, Clone, Copy)]
pub struct HsqldbDialect;

impl Dialect for HsqldbDialect {
   fn name(&self) -> &'static str {
      "hsqldb"
   }

   fn limit_sql(&self, sql: &str, request: &PageRequest) -> Result<String> {
      Ok(limit_offset(sql, request))
   }
}

#[cfg(test)]
mod tests {
   use super::*;

   #[test]
   fn postgres_limit_offset() {
      let request = PageRequest::new(1, 5);
      assert_eq!(
         PostgreSqlDialect.limit_sql("SELECT 1", &request).unwrap(),
         "SELECT 1 LIMIT 5"
      );

      let request = PageRequest::new(4, 5);
      assert_eq!(
         PostgreSqlDialect.limit_sql("SELECT 1", &request).unwrap(),
         "SELECT 1 LIMIT 5 OFFSET 15"
      );
   }

   #[test]
   fn hsqldb_matches_postgres() {
      let request = PageRequest::new(2, 50);
      assert_eq!(
         HsqldbDialect.limit_sql("SELECT * FROM t", &request).unwrap(),
         PostgreSqlDialect.limit_sql("SELECT * FROM t", &request).unwrap()
      );
   }
}
