use std::fmt;
use std::sync::Arc;

use crate::statement::{CacheKey, Statement};

/// Which statement of a paginated execution is about to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatementKind {
   /// The caller's statement, before any rewrite.
   Original,
   Count,
   Page,
}

/// Hook that may rewrite a statement and its cache key before execution.
///
/// Closures with the matching signature implement this trait.
pub trait StatementInterceptor: Send + Sync {
   fn intercept(&self, kind: StatementKind, statement: Statement, key: &mut CacheKey) -> Statement;
}

impl<F> StatementInterceptor for F
where
   F: Fn(StatementKind, Statement, &mut CacheKey) -> Statement + Send + Sync,
{
   fn intercept(&self, kind: StatementKind, statement: Statement, key: &mut CacheKey) -> Statement {
      self(kind, statement, key)
   }
}

/// Ordered list of interceptors, applied first to last.
#[derive(Clone, Default)]
pub struct InterceptorChain {
   interceptors: Vec<Arc<dyn StatementInterceptor>>,
}

impl InterceptorChain {
   pub fn push(&mut self, interceptor: Arc<dyn StatementInterceptor>) {
      self.interceptors.push(interceptor);
   }

   /// This chain followed by `other`.
   pub fn then(&self, other: &InterceptorChain) -> InterceptorChain {
      let mut interceptors = self.interceptors.clone();
      interceptors.extend(other.interceptors.iter().cloned());
      InterceptorChain { interceptors }
   }

   pub fn len(&self) -> usize {
      self.interceptors.len()
   }

   pub fn is_empty(&self) -> bool {
      self.interceptors.is_empty()
   }

   pub fn apply(&self, kind: StatementKind, statement: Statement, key: &mut CacheKey) -> Statement {
      self
         .interceptors
         .iter()
         .fold(statement, |statement, interceptor| {
            interceptor.intercept(kind, statement, key)
         })
   }
}

impl fmt::Debug for InterceptorChain {
   fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
      f.debug_struct("InterceptorChain")
         .field("len", &self.interceptors.len())
         .finish()
   }
}
