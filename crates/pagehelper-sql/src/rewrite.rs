//! Count and ORDER BY rewrites.

use std::ops::Range;

use tracing::trace;

use crate::error::{Result, SqlError};
use crate::scanner::Scan;

/// Options controlling which ORDER BY clauses [`count_sql`] keeps.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CountOptions {
   /// Keep the outermost ORDER BY.
   pub keep_order_by: bool,
   /// Keep ORDER BY clauses inside parenthesized sub-selects.
   pub keep_sub_select_order_by: bool,
}

/// Aggregate functions whose presence in a select list forbids the simple
/// `SELECT COUNT(..) FROM` rewrite.
const AGGREGATES: &[&[u8]] = &[
   b"COUNT",
   b"SUM",
   b"AVG",
   b"MIN",
   b"MAX",
   b"GROUP_CONCAT",
   b"STRING_AGG",
   b"ARRAY_AGG",
   b"LISTAGG",
   b"JSON_ARRAYAGG",
   b"JSON_OBJECTAGG",
   b"JSON_AGG",
   b"BIT_AND",
   b"BIT_OR",
   b"BOOL_AND",
   b"BOOL_OR",
   b"EVERY",
   b"STDDEV",
   b"VARIANCE",
];

/// Top-level clauses that change the row count of a select, forcing the
/// wrapped `SELECT COUNT(..) FROM (..) tmp_count` form.
const ROW_SHAPING_CLAUSES: &[&[&[u8]]] = &[
   &[b"UNION"],
   &[b"INTERSECT"],
   &[b"EXCEPT"],
   &[b"MINUS"],
   &[b"GROUP", b"BY"],
   &[b"HAVING"],
   &[b"INTO"],
   &[b"WINDOW"],
   &[b"QUALIFY"],
   &[b"CONNECT", b"BY"],
   &[b"FOR"],
   &[b"LOCK"],
];

/// Select modifiers that change the row count.
const ROW_SHAPING_MODIFIERS: &[&[u8]] =
   &[b"DISTINCT", b"DISTINCTROW", b"UNIQUE", b"TOP", b"SQL_CALC_FOUND_ROWS"];

/// An ORDER BY clause located within one query level.
struct OrderByClause {
   /// From `ORDER` through the last non-whitespace byte of the clause.
   span: Range<usize>,
   /// The sort items after `ORDER BY`, trimmed.
   items: Range<usize>,
}

/// Trim whitespace and trailing statement terminators.
///
/// When the statement ends inside a `--` comment a newline is appended, so
/// that clauses appended later are not swallowed by the comment.
pub fn normalize(sql: &str) -> String {
   let mut out = sql
      .trim()
      .trim_end_matches(|c: char| c == ';' || c.is_whitespace())
      .to_string();
   if Scan::new(&out).ends_in_line_comment() {
      out.push('\n');
   }
   out
}

/// Whether `fragment` contains bind placeholders outside literals and comments.
pub fn has_bind_parameters(fragment: &str) -> bool {
   let scan = Scan::new(fragment);
   scan.has_bind_parameters(0..scan.len())
}

/// Name of the top-level limiting clause (`LIMIT`, `OFFSET`, `FETCH` or
/// `TOP`) in `sql`, if any.
pub fn top_level_limiting_clause(sql: &str) -> Option<&'static str> {
   let scan = Scan::new(sql);
   limiting_clause(&scan, 0..scan.len(), 0).map(|(_, name)| name)
}

/// Ensure `sql` can take an appended limiting clause.
///
/// A top-level LIMIT/OFFSET/FETCH/TOP would conflict with the one a dialect
/// appends. Limiting clauses inside sub-selects, comments and literals are
/// fine.
pub fn validate_page_base(sql: &str) -> Result<()> {
   match top_level_limiting_clause(sql) {
      Some(clause) => Err(SqlError::ExistingLimit {
         clause: clause.to_string(),
      }),
      None => Ok(()),
   }
}

/// Build the statement counting the rows `sql` would return.
///
/// Plain selects are rewritten in place (`SELECT COUNT(col) FROM ...`).
/// Anything whose row count depends on its select list or on top-level
/// shaping clauses (DISTINCT, GROUP BY, set operators, aggregates, LIMIT,
/// ...) is wrapped as `SELECT COUNT(col) FROM (<sql>) tmp_count`.
///
/// ORDER BY clauses are dropped unless `options` says to keep them. An ORDER
/// BY referencing bind parameters, or one that bounds a LIMIT at the same
/// level, is always kept.
pub fn count_sql(sql: &str, count_column: &str, options: CountOptions) -> Result<String> {
   let sql = normalize(sql);
   if sql.is_empty() {
      return Err(SqlError::EmptyStatement);
   }

   let stripped = strip_order_by(&sql, options);
   let scan = Scan::new(&stripped);

   let count = match simple_from(&scan) {
      Some(from) => format!("SELECT COUNT({}) {}", count_column, &stripped[from..]),
      None => format!(
         "SELECT COUNT({}) FROM ({}) tmp_count",
         count_column, stripped
      ),
   };

   trace!(original = %sql, count = %count, "Derived count statement");
   Ok(count)
}

/// Replace the top-level ORDER BY of `sql` with `ORDER BY <order_by>`.
///
/// The new clause lands where an ORDER BY belongs: before any top-level
/// LIMIT/OFFSET/FETCH or locking clause, otherwise at the end. If the
/// existing clause is already the requested one the statement is returned
/// unchanged.
pub fn replace_order_by(sql: &str, order_by: &str) -> Result<String> {
   let sql = normalize(sql);
   if sql.is_empty() {
      return Err(SqlError::EmptyStatement);
   }

   let scan = Scan::new(&sql);
   let base = match order_by_clause(&scan, 0..scan.len(), 0) {
      Some(clause) => {
         let existing = &sql[clause.items.clone()];
         if same_expression(existing, order_by) {
            return Ok(sql);
         }
         if scan.has_bind_parameters(clause.items.clone()) {
            return Err(SqlError::OrderByHasParameters {
               order_by: existing.to_string(),
            });
         }
         let cut = removal_span(&sql, &clause);
         normalize(&format!("{}{}", &sql[..cut.start], &sql[cut.end..]))
      }
      None => sql,
   };

   let scan = Scan::new(&base);
   let rewritten = match tail_clause_start(&scan) {
      Some(pos) => {
         let (head, tail) = base.split_at(pos);
         format!("{} ORDER BY {} {}", head.trim_end(), order_by, tail)
      }
      None => format!("{} ORDER BY {}", base, order_by),
   };

   trace!(order_by = %order_by, sql = %rewritten, "Replaced ORDER BY");
   Ok(rewritten)
}

/// Split the top-level ORDER BY off `sql`.
///
/// Returns the statement without the clause and the clause's sort items.
pub fn split_order_by(sql: &str) -> (String, Option<String>) {
   let sql = normalize(sql);
   let scan = Scan::new(&sql);
   match order_by_clause(&scan, 0..scan.len(), 0) {
      Some(clause) => {
         let items = sql[clause.items.clone()].to_string();
         let cut = removal_span(&sql, &clause);
         let rest = normalize(&format!("{}{}", &sql[..cut.start], &sql[cut.end..]));
         (rest, Some(items))
      }
      None => (sql, None),
   }
}

/// Locate a limiting clause at `depth` within `range`.
fn limiting_clause(scan: &Scan, range: Range<usize>, depth: i32) -> Option<(usize, &'static str)> {
   let end = range.end.min(scan.len());
   for i in range.start..end {
      if scan.word_at(i, depth, b"LIMIT") {
         return Some((i, "LIMIT"));
      }
      if scan.word_at(i, depth, b"OFFSET")
         && scan
            .next_code_byte(i + b"OFFSET".len())
            .is_some_and(|b| b.is_ascii_digit() || matches!(b, b'?' | b'$' | b':' | b'@' | b'('))
      {
         return Some((i, "OFFSET"));
      }
      if scan.phrase_at(i, &[b"FETCH", b"FIRST"], depth).is_some()
         || scan.phrase_at(i, &[b"FETCH", b"NEXT"], depth).is_some()
      {
         return Some((i, "FETCH"));
      }
      if scan.word_at(i, depth, b"SELECT") && select_has_top(scan, i + b"SELECT".len()) {
         return Some((i, "TOP"));
      }
   }
   None
}

fn select_has_top(scan: &Scan, after_select: usize) -> bool {
   let Some(word) = scan.next_word(after_select) else {
      return false;
   };
   match scan.upper(word.clone()) {
      b"TOP" => true,
      b"DISTINCT" | b"ALL" => scan
         .next_word(word.end)
         .is_some_and(|next| scan.upper(next) == b"TOP"),
      _ => false,
   }
}

/// Start of the first clause that must follow ORDER BY at the top level.
fn tail_clause_start(scan: &Scan) -> Option<usize> {
   let len = scan.len();
   let limit = limiting_clause(scan, 0..len, 0)
      .filter(|(_, name)| *name != "TOP")
      .map(|(pos, _)| pos);
   let lock = scan
      .find_phrase(&[b"FOR"], 0..len, 0)
      .or_else(|| scan.find_phrase(&[b"LOCK"], 0..len, 0))
      .map(|span| span.start);
   match (limit, lock) {
      (Some(a), Some(b)) => Some(a.min(b)),
      (a, b) => a.or(b),
   }
}

/// The ORDER BY clause at `depth` within `range`, up to the next limiting or
/// locking clause at the same depth.
fn order_by_clause(scan: &Scan, range: Range<usize>, depth: i32) -> Option<OrderByClause> {
   let phrase = scan.find_phrase(&[b"ORDER", b"BY"], range.clone(), depth)?;
   let mut end = range.end.min(scan.len());
   if let Some((limit, _)) = limiting_clause(scan, phrase.end..end, depth) {
      end = limit;
   }
   if let Some(lock) = scan
      .find_phrase(&[b"FOR"], phrase.end..end, depth)
      .or_else(|| scan.find_phrase(&[b"LOCK"], phrase.end..end, depth))
   {
      end = lock.start;
   }

   let upper = scan.upper(0..scan.len());
   while end > phrase.end && upper[end - 1].is_ascii_whitespace() {
      end -= 1;
   }
   let mut items_start = phrase.end;
   while items_start < end && upper[items_start].is_ascii_whitespace() {
      items_start += 1;
   }

   Some(OrderByClause {
      span: phrase.start..end,
      items: items_start..end,
   })
}

/// Clause span widened to swallow the whitespace preceding it.
fn removal_span(sql: &str, clause: &OrderByClause) -> Range<usize> {
   let bytes = sql.as_bytes();
   let mut start = clause.span.start;
   while start > 0 && bytes[start - 1].is_ascii_whitespace() {
      start -= 1;
   }
   start..clause.span.end
}

/// Drop ORDER BY clauses that do not affect the row count.
fn strip_order_by(sql: &str, options: CountOptions) -> String {
   let scan = Scan::new(sql);
   let len = scan.len();
   let mut cuts: Vec<Range<usize>> = Vec::new();

   if !options.keep_order_by
      && limiting_clause(&scan, 0..len, 0).is_none()
      && let Some(clause) = order_by_clause(&scan, 0..len, 0)
      && !scan.has_bind_parameters(clause.items.clone())
   {
      cuts.push(removal_span(sql, &clause));
   }

   if !options.keep_sub_select_order_by {
      for (inner, depth) in scan.sub_selects() {
         if limiting_clause(&scan, inner.clone(), depth).is_some() {
            continue;
         }
         if let Some(clause) = order_by_clause(&scan, inner, depth)
            && !scan.has_bind_parameters(clause.items.clone())
         {
            cuts.push(removal_span(sql, &clause));
         }
      }
   }

   if cuts.is_empty() {
      return sql.to_string();
   }

   cuts.sort_by_key(|cut| cut.start);
   let mut out = String::with_capacity(sql.len());
   let mut pos = 0;
   for cut in cuts {
      // Nested inside a clause already removed
      if cut.start < pos {
         continue;
      }
      out.push_str(&sql[pos..cut.start]);
      pos = cut.end;
   }
   out.push_str(&sql[pos..]);
   normalize(&out)
}

/// Offset of the top-level FROM when the plain rewrite preserves the count.
fn simple_from(scan: &Scan) -> Option<usize> {
   let len = scan.len();
   let select = scan.next_word(0)?;
   if scan.upper(select.clone()) != b"SELECT" {
      return None;
   }
   if let Some(modifier) = scan.next_word(select.end)
      && ROW_SHAPING_MODIFIERS.contains(&scan.upper(modifier))
   {
      return None;
   }

   let from = scan.find_phrase(&[b"FROM"], select.end..len, 0)?;
   if ROW_SHAPING_CLAUSES
      .iter()
      .any(|clause| scan.find_phrase(clause, 0..len, 0).is_some())
   {
      return None;
   }
   if limiting_clause(scan, 0..len, 0).is_some() {
      return None;
   }
   // A kept ORDER BY is invalid next to a bare aggregate on most engines
   if scan.find_phrase(&[b"ORDER", b"BY"], from.end..len, 0).is_some() {
      return None;
   }

   let select_list = select.end..from.start;
   if scan.has_bind_parameters(select_list.clone()) || has_aggregate(scan, select_list) {
      return None;
   }

   Some(from.start)
}

fn has_aggregate(scan: &Scan, mut range: Range<usize>) -> bool {
   range.any(|i| {
      scan.keyword_at(i, b"OVER")
         || AGGREGATES.iter().any(|name| {
            scan.keyword_at(i, name) && scan.next_code_byte(i + name.len()) == Some(b'(')
         })
   })
}

fn same_expression(a: &str, b: &str) -> bool {
   let squash = |s: &str| s.split_whitespace().collect::<Vec<_>>().join(" ");
   squash(a).eq_ignore_ascii_case(&squash(b))
}
