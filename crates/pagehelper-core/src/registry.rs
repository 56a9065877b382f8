use std::collections::HashMap;

use tracing::debug;

use crate::dialect::{Dialect, DialectKind};
use crate::{Error, Result};

/// Constructor for a fresh dialect instance.
pub type DialectFactory = fn() -> Box<dyn Dialect>;

/// Name to dialect-factory mapping.
///
/// Names are case-insensitive. Every built-in dialect is registered under
/// all of its aliases; custom factories and aliases can be added on top.
#[derive(Clone)]
pub struct DialectRegistry {
   factories: HashMap<String, DialectFactory>,
}

impl DialectRegistry {
   pub fn empty() -> Self {
      Self {
         factories: HashMap::new(),
      }
   }

   /// Registry holding the built-in dialects.
   pub fn with_builtin() -> Self {
      let mut registry = Self::empty();
      for kind in DialectKind::ALL {
         let factory = builtin_factory(kind);
         for alias in kind.aliases() {
            registry.register(alias, factory);
         }
      }
      registry
   }

   /// Register `factory` under `name`, replacing any previous entry.
   pub fn register(&mut self, name: &str, factory: DialectFactory) {
      self.factories.insert(name.to_ascii_lowercase(), factory);
   }

   /// Make `alias` resolve to whatever `target` resolves to.
   pub fn alias(&mut self, alias: &str, target: &str) -> Result<()> {
      let factory = self.factory(target)?;
      self.register(alias, factory);
      Ok(())
   }

   pub fn contains(&self, name: &str) -> bool {
      self.factories.contains_key(&name.to_ascii_lowercase())
   }

   /// Create a dialect by registered name.
   pub fn resolve(&self, name: &str) -> Result<Box<dyn Dialect>> {
      Ok((self.factory(name)?)())
   }

   /// Name of the dialect matching a database product name.
   ///
   /// Tried in order: the whole name with spaces and punctuation removed
   /// (`SQL Server 2012` is `sqlserver2012`), well-known driver product
   /// names (`Microsoft SQL Server`, `HSQL Database Engine`, ...), then any
   /// single word of the name. Among words longer registered names win, so
   /// `oracle9i` beats `oracle`.
   pub fn detect(&self, product_name: &str) -> Result<String> {
      let normalized = normalize_product(product_name);
      let words: Vec<&str> = normalized.split(' ').collect();
      let squashed = words.concat();
      let padded = format!(" {normalized} ");

      let known = || {
         KNOWN_PRODUCTS
            .iter()
            .filter(|(product, name)| padded.contains(&format!(" {product} ")) && self.contains(name))
            .max_by_key(|(product, _)| product.len())
            .map(|(_, name)| name.to_string())
      };
      let by_word = || {
         let mut names: Vec<&String> = self.factories.keys().collect();
         names.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));
         names
            .into_iter()
            .find(|name| words.contains(&name.as_str()))
            .cloned()
      };

      let detected = Some(squashed)
         .filter(|name| self.contains(name))
         .or_else(known)
         .or_else(by_word)
         .ok_or_else(|| Error::UnsupportedDialect(product_name.to_string()))?;

      debug!(product = %product_name, dialect = %detected, "Detected dialect");
      Ok(detected)
   }

   /// Registered names in sorted order.
   pub fn names(&self) -> Vec<&str> {
      let mut names: Vec<&str> = self.factories.keys().map(String::as_str).collect();
      names.sort_unstable();
      names
   }

   fn factory(&self, name: &str) -> Result<DialectFactory> {
      self
         .factories
         .get(&name.to_ascii_lowercase())
         .copied()
         .ok_or_else(|| Error::UnsupportedDialect(name.to_string()))
   }
}

/// Product names reported by drivers that no alias spells out.
const KNOWN_PRODUCTS: &[(&str, &str)] = &[
   ("microsoft sql server", "sqlserver"),
   ("sql server", "sqlserver"),
   ("hsql database engine", "hsqldb"),
   ("apache derby", "derby"),
   ("firebird", "firebirdsql"),
   ("dm dbms", "dm"),
   ("kingbasees", "kingbase"),
   ("enterprisedb", "edb"),
   ("informix dynamic server", "informix"),
];

/// Lowercase `product`, keeping letters, digits and `-` and collapsing
/// everything else into single spaces.
fn normalize_product(product: &str) -> String {
   product
      .to_ascii_lowercase()
      .split(|c: char| !(c.is_ascii_alphanumeric() || c == '-'))
      .filter(|word| !word.is_empty())
      .collect::<Vec<_>>()
      .join(" ")
}

impl Default for DialectRegistry {
   fn default() -> Self {
      Self::with_builtin()
   }
}

fn builtin_factory(kind: DialectKind) -> DialectFactory {
   match kind {
      DialectKind::MySql => || DialectKind::MySql.create(),
      DialectKind::PostgreSql => || DialectKind::PostgreSql.create(),
      DialectKind::Hsqldb => || DialectKind::Hsqldb.create(),
      DialectKind::Oracle => || DialectKind::Oracle.create(),
      DialectKind::Oracle9i => || DialectKind::Oracle9i.create(),
      DialectKind::Db2 => || DialectKind::Db2.create(),
      DialectKind::As400 => || DialectKind::As400.create(),
      DialectKind::Informix => || DialectKind::Informix.create(),
      DialectKind::SqlServer => || DialectKind::SqlServer.create(),
      DialectKind::SqlServer2012 => || DialectKind::SqlServer2012.create(),
      DialectKind::OffsetFetch => || DialectKind::OffsetFetch.create(),
   }
}

#[cfg(test)]
mod tests {
   use super::*;
   use crate::request::PageRequest;

   #[test]
   fn resolves_aliases_case_insensitively() {
      let registry = DialectRegistry::with_builtin();
      assert_eq!(registry.resolve("MySQL").unwrap().name(), "mysql");
      assert_eq!(registry.resolve("sqlite").unwrap().name(), "mysql");
      assert_eq!(registry.resolve("h2").unwrap().name(), "hsqldb");
      assert_eq!(registry.resolve("dm").unwrap().name(), "oracle");
      assert_eq!(registry.resolve("firebirdsql").unwrap().name(), "derby");
      assert_eq!(registry.resolve("opengauss").unwrap().name(), "postgresql");
   }

   #[test]
   fn unknown_name_is_unsupported() {
      let registry = DialectRegistry::with_builtin();
      let err = registry.resolve("cobol-db").err().unwrap();
      assert_eq!(err.error_code(), "UNSUPPORTED_DIALECT");
   }

   #[test]
   fn detect_prefers_longest_alias() {
      let registry = DialectRegistry::with_builtin();
      assert_eq!(registry.detect("Microsoft SQLServer2012").unwrap(), "sqlserver2012");
      assert_eq!(registry.detect("sqlserver").unwrap(), "sqlserver");
      assert_eq!(registry.detect("Oracle9i Enterprise").unwrap(), "oracle9i");
      assert_eq!(registry.detect("PostgreSQL 16.2").unwrap(), "postgresql");
      assert_eq!(registry.detect("SQLite").unwrap(), "sqlite");
      assert_eq!(registry.detect("informix-sqli").unwrap(), "informix-sqli");
   }

   #[test]
   fn detect_real_product_names() {
      let registry = DialectRegistry::with_builtin();
      assert_eq!(registry.detect("Microsoft SQL Server").unwrap(), "sqlserver");
      assert_eq!(registry.detect("HSQL Database Engine").unwrap(), "hsqldb");
      assert_eq!(registry.detect("Apache Derby").unwrap(), "derby");
      assert_eq!(registry.detect("Firebird").unwrap(), "firebirdsql");
      assert_eq!(registry.detect("DM DBMS").unwrap(), "dm");
      assert_eq!(registry.detect("DB2/LINUXX8664").unwrap(), "db2");
      assert_eq!(registry.detect("H2").unwrap(), "h2");
      assert_eq!(registry.detect("MySQL").unwrap(), "mysql");
      assert_eq!(registry.detect("Oracle Database 19c Enterprise Edition").unwrap(), "oracle");
      assert_eq!(registry.detect("SQL Server").unwrap(), "sqlserver");
      assert_eq!(registry.detect("SQL Server 2012").unwrap(), "sqlserver2012");
   }

   #[test]
   fn detect_ignores_aliases_inside_words() {
      let registry = DialectRegistry::with_builtin();
      // "dm" and "h2" must not match as fragments of longer words
      assert!(registry.detect("Admin Console").is_err());
      assert!(registry.detect("Ch2Base").is_err());
      assert!(registry.detect("CockroachDB").is_err());
   }

   #[test]
   fn known_products_need_a_registered_target() {
      let mut registry = DialectRegistry::empty();
      registry.register("mssql", || DialectKind::SqlServer.create());
      assert!(registry.detect("Microsoft SQL Server").is_err());
      assert_eq!(registry.detect("MSSQL").unwrap(), "mssql");
   }

   #[test]
   fn detect_unknown_product() {
      let registry = DialectRegistry::with_builtin();
      assert!(matches!(
         registry.detect("Pick BASIC"),
         Err(Error::UnsupportedDialect(name)) if name == "Pick BASIC"
      ));
   }

   #[test]
   fn alias_requires_known_target() {
      let mut registry = DialectRegistry::with_builtin();
      registry.alias("tidb", "mysql").unwrap();
      assert_eq!(registry.resolve("TiDB").unwrap().name(), "mysql");
      assert!(registry.alias("x", "nope").is_err());
   }

   struct TopOnly;

   impl Dialect for TopOnly {
      fn name(&self) -> &'static str {
         "toponly"
      }

      fn limit_sql(&self, sql: &str, request: &PageRequest) -> Result<String> {
         Ok(format!("{sql} TAKE {}", request.end_row()))
      }
   }

   #[test]
   fn custom_factory() {
      let mut registry = DialectRegistry::empty();
      registry.register("toponly", || Box::new(TopOnly) as Box<dyn Dialect>);
      assert_eq!(registry.names(), vec!["toponly"]);

      let dialect = registry.resolve("toponly").unwrap();
      assert_eq!(
         dialect.limit_sql("SELECT 1", &PageRequest::new(2, 5)).unwrap(),
         "SELECT 1 TAKE 10"
      );
   }
}
