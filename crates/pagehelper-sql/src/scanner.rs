//! Lexical scanning of SQL text.
//!
//! The scanner does not parse grammar. It classifies every byte of a
//! statement as code, literal (string or quoted identifier) or comment, and
//! records the parenthesis depth it sits at. That is enough to find clause
//! keywords belonging to the outermost query, or to one particular
//! parenthesized sub-select, while ignoring look-alikes inside literals,
//! comments, function calls and window specifications.
//!
//! Offsets are byte offsets into the original text. Uppercasing is ASCII
//! only, so offsets stay valid for statements containing multi-byte UTF-8.

use std::ops::Range;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Class {
   Code,
   Literal,
   Comment,
}

fn is_ident_byte(b: u8) -> bool {
   b.is_ascii_alphanumeric() || b == b'_' || b == b'$'
}

/// Literal or comment starting at `i`, as an end-exclusive span.
///
/// Quotes (`'`, `"`, `` ` ``) escape themselves by doubling. Unterminated
/// literals and comments run to the end of the text.
fn opaque_span(bytes: &[u8], i: usize) -> Option<(Range<usize>, Class)> {
   let rest = &bytes[i..];
   let (len, class) = match rest {
      [quote @ (b'\'' | b'"' | b'`'), ..] => (quoted_len(rest, *quote), Class::Literal),
      [b'-', b'-', ..] => (
         rest.iter().position(|&b| b == b'\n').unwrap_or(rest.len()),
         Class::Comment,
      ),
      [b'/', b'*', body @ ..] => (
         body.windows(2).position(|w| w == b"*/").map_or(rest.len(), |k| k + 4),
         Class::Comment,
      ),
      _ => return None,
   };
   Some((i..i + len, class))
}

/// Length of the quoted token at the start of `rest`, both quotes included.
fn quoted_len(rest: &[u8], quote: u8) -> usize {
   let mut from = 1;
   while let Some(k) = rest[from..].iter().position(|&b| b == quote) {
      let close = from + k;
      if rest.get(close + 1) != Some(&quote) {
         return close + 1;
      }
      from = close + 2;
   }
   rest.len()
}

/// Byte classification and parenthesis depth for one statement.
///
/// An opening parenthesis sits at the depth outside it and its content one
/// level deeper; the closing parenthesis is back at the outer depth.
pub(crate) struct Scan {
   upper: Vec<u8>,
   class: Vec<Class>,
   depth: Vec<i32>,
   ends_in_line_comment: bool,
}

impl Scan {
   pub(crate) fn new(sql: &str) -> Self {
      let upper = sql.as_bytes().to_ascii_uppercase();
      let len = upper.len();
      let mut class = vec![Class::Code; len];
      let mut depth = vec![0; len];
      let mut ends_in_line_comment = false;
      let mut current: i32 = 0;
      let mut i = 0;

      while i < len {
         if let Some((span, kind)) = opaque_span(&upper, i) {
            ends_in_line_comment = upper[i] == b'-' && span.end == len;
            class[span.clone()].fill(kind);
            depth[span.clone()].fill(current);
            i = span.end;
            continue;
         }
         match upper[i] {
            b'(' => {
               depth[i] = current;
               current += 1;
            }
            b')' => {
               current -= 1;
               depth[i] = current;
            }
            b => {
               depth[i] = current;
               if !b.is_ascii_whitespace() {
                  ends_in_line_comment = false;
               }
            }
         }
         i += 1;
      }

      Self {
         upper,
         class,
         depth,
         ends_in_line_comment,
      }
   }

   pub(crate) fn len(&self) -> usize {
      self.upper.len()
   }

   /// True when the statement ends inside a `--` comment, so anything
   /// appended on the same line would be commented out.
   pub(crate) fn ends_in_line_comment(&self) -> bool {
      self.ends_in_line_comment
   }

   /// Uppercased bytes for `range`.
   pub(crate) fn upper(&self, range: Range<usize>) -> &[u8] {
      &self.upper[range]
   }

   fn is_code(&self, i: usize) -> bool {
      self.class[i] == Class::Code
   }

   /// Whether `word` starts at `i` as a code keyword, at any depth.
   ///
   /// The bytes on either side must not be identifier bytes, so `ORDER`
   /// does not match inside `reorder_queue`.
   pub(crate) fn keyword_at(&self, i: usize, word: &[u8]) -> bool {
      let end = i + word.len();
      end <= self.len()
         && self.is_code(i)
         && &self.upper[i..end] == word
         && (i == 0 || !is_ident_byte(self.upper[i - 1]))
         && self.upper.get(end).is_none_or(|&b| !is_ident_byte(b))
   }

   /// Whether `word` starts at `i` as a code keyword at paren depth `depth`.
   pub(crate) fn word_at(&self, i: usize, depth: i32, word: &[u8]) -> bool {
      self.keyword_at(i, word) && self.depth[i] == depth
   }

   /// Match a whitespace-separated keyword sequence (e.g. `ORDER BY`)
   /// starting at `i`, returning its span.
   pub(crate) fn phrase_at(&self, i: usize, words: &[&[u8]], depth: i32) -> Option<Range<usize>> {
      let mut pos = i;
      for (n, word) in words.iter().enumerate() {
         if n > 0 {
            pos = self.skip_whitespace(pos);
         }
         if !self.word_at(pos, depth, word) {
            return None;
         }
         pos += word.len();
      }
      Some(i..pos)
   }

   /// First occurrence of `words` at `depth` within `range`.
   pub(crate) fn find_phrase(
      &self,
      words: &[&[u8]],
      range: Range<usize>,
      depth: i32,
   ) -> Option<Range<usize>> {
      let end = range.end.min(self.len());
      (range.start..end).find_map(|i| self.phrase_at(i, words, depth))
   }

   fn skip_whitespace(&self, mut i: usize) -> usize {
      while i < self.len() && self.is_code(i) && self.upper[i].is_ascii_whitespace() {
         i += 1;
      }
      i
   }

   fn skip_trivia(&self, mut i: usize) -> usize {
      while i < self.len()
         && (self.class[i] == Class::Comment || self.upper[i].is_ascii_whitespace())
      {
         i += 1;
      }
      i
   }

   /// First code byte at or after `i`, skipping whitespace and comments.
   pub(crate) fn next_code_byte(&self, i: usize) -> Option<u8> {
      let i = self.skip_trivia(i);
      (i < self.len() && self.is_code(i)).then(|| self.upper[i])
   }

   /// Span of the identifier-like word at or after `i`, skipping only
   /// whitespace and comments.
   pub(crate) fn next_word(&self, i: usize) -> Option<Range<usize>> {
      let start = self.skip_trivia(i);
      let mut end = start;
      while end < self.len() && self.is_code(end) && is_ident_byte(self.upper[end]) {
         end += 1;
      }
      (end > start).then_some(start..end)
   }

   /// Index of the parenthesis closing the one opened at `open`.
   pub(crate) fn matching_paren(&self, open: usize) -> Option<usize> {
      let depth = self.depth[open];
      (open + 1..self.len())
         .find(|&j| self.is_code(j) && self.upper[j] == b')' && self.depth[j] == depth)
   }

   /// Inner spans of every parenthesized sub-select (content starting with
   /// SELECT or WITH), paired with the depth of that content.
   pub(crate) fn sub_selects(&self) -> Vec<(Range<usize>, i32)> {
      let mut found = Vec::new();
      for open in 0..self.len() {
         if !(self.is_code(open) && self.upper[open] == b'(') {
            continue;
         }
         let Some(close) = self.matching_paren(open) else {
            continue;
         };
         let starts_select = self.next_word(open + 1).is_some_and(|word| {
            word.end <= close && matches!(self.upper(word), b"SELECT" | b"WITH")
         });
         if starts_select {
            found.push((open + 1..close, self.depth[open] + 1));
         }
      }
      found
   }

   /// Whether any bind placeholder (`?`, `$1`, `:name`, `@name`) appears in
   /// code within `range`.
   pub(crate) fn has_bind_parameters(&self, range: Range<usize>) -> bool {
      let end = range.end.min(self.len());
      (range.start..end).any(|i| self.is_code(i) && self.is_parameter_at(i))
   }

   fn is_parameter_at(&self, i: usize) -> bool {
      let bytes = &self.upper;
      let next = bytes.get(i + 1).copied();
      let prev = i.checked_sub(1).map(|p| bytes[p]);
      match bytes[i] {
         b'?' => true,
         b'$' => {
            next.is_some_and(|c| c.is_ascii_digit()) && !prev.is_some_and(is_ident_byte)
         }
         marker @ (b':' | b'@') => {
            next.is_some_and(|c| c.is_ascii_alphabetic() || c == b'_') && prev != Some(marker)
         }
         _ => false,
      }
   }
}
