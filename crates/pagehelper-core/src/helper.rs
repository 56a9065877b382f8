use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;
use serde_json::{Map, Value as JsonValue};
use tracing::{debug, trace};
use uuid::Uuid;

use crate::config::PageHelperConfig;
use crate::dialect::Dialect;
use crate::interceptor::{InterceptorChain, StatementInterceptor, StatementKind};
use crate::navigation::NavigationView;
use crate::page::{Page, QueryOutcome};
use crate::registry::{DialectFactory, DialectRegistry};
use crate::request::PageRequest;
use crate::row_bounds::RowBounds;
use crate::runner::StatementRunner;
use crate::safety::SqlSafety;
use crate::statement::{CacheKey, Row, Statement};
use crate::worker::CountPool;
use crate::{Error, Result};

/// Handle to a [`PageRequest`] attached with [`PageHelper::attach`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ContextToken(Uuid);

impl fmt::Display for ContextToken {
   fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
      fmt::Display::fmt(&self.0, f)
   }
}

/// State of one paginated execution: the dialect instance, the request being
/// finalized and the statements generated for it.
///
/// `after_all` runs exactly once, on completion, on error, or when the
/// execution future is dropped mid-flight.
struct PageContext {
   dialect: Box<dyn Dialect>,
   request: PageRequest,
   count_sql: Option<String>,
   page_sql: Option<String>,
   finished: bool,
}

impl PageContext {
   fn new(dialect: Box<dyn Dialect>, request: PageRequest) -> Self {
      Self {
         dialect,
         request,
         count_sql: None,
         page_sql: None,
         finished: false,
      }
   }

   fn request(&self) -> &PageRequest {
      &self.request
   }

   fn dialect_name(&self) -> &'static str {
      self.dialect.name()
   }

   fn skip(&mut self) -> bool {
      self.dialect.skip(&self.request)
   }

   fn before_count(&mut self) -> bool {
      self.dialect.before_count(&self.request)
   }

   /// Count statement for `statement`; `manual` replaces the derived one.
   fn count_statement(
      &mut self,
      statement: &Statement,
      manual: Option<&str>,
      key: &mut CacheKey,
   ) -> Result<Statement> {
      let count = match manual {
         Some(query) => {
            key.update("count");
            statement.rewritten(query.to_string())
         }
         None => self.dialect.count_statement(statement, &self.request, key)?,
      };
      self.count_sql = Some(count.query.clone());
      Ok(count)
   }

   fn after_count(&mut self, total: i64) -> bool {
      self.dialect.after_count(total, &mut self.request)
   }

   fn before_page(&mut self) -> bool {
      self.dialect.before_page(&self.request)
   }

   fn page_statement(&mut self, statement: &Statement, key: &mut CacheKey) -> Result<Statement> {
      let page = self.dialect.page_statement(statement, &self.request, key)?;
      self.page_sql = Some(page.query.clone());
      Ok(page)
   }

   fn after_page(&mut self, rows: Vec<Row>) -> Vec<Row> {
      self.dialect.after_page(rows, &mut self.request)
   }

   fn finish(&mut self) {
      if self.finished {
         return;
      }
      self.finished = true;
      trace!(
         dialect = self.dialect.name(),
         count_sql = ?self.count_sql,
         page_sql = ?self.page_sql,
         "Releasing page context"
      );
      self.dialect.after_all();
      self.count_sql = None;
      self.page_sql = None;
   }
}

impl Drop for PageContext {
   fn drop(&mut self) {
      self.finish();
   }
}

/// Count-then-page query engine.
///
/// Cheap to clone; clones share configuration, the count worker pool and
/// attached contexts. Concurrent executions never share per-execution
/// state.
///
/// # Example
///
/// ```no_run
/// # use std::sync::Arc;
/// # use pagehelper_core::{PageHelper, PageHelperConfig, PageRequest, Statement, StatementRunner};
/// # async fn example(runner: Arc<dyn StatementRunner>) -> pagehelper_core::Result<()> {
/// let helper = PageHelper::builder(runner)
///    .config(PageHelperConfig {
///       helper_dialect: Some("postgresql".into()),
///       ..Default::default()
///    })
///    .build()?;
///
/// let page = helper
///    .paginate(
///       PageRequest::new(2, 20).with_order_by("created_at DESC")?,
///       Statement::new("SELECT * FROM posts WHERE author = $1", vec!["ada".into()]),
///    )
///    .await?;
/// println!("{} of {} rows", page.rows.len(), page.total);
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct PageHelper {
   inner: Arc<Inner>,
}

struct Inner {
   config: PageHelperConfig,
   runner: Arc<dyn StatementRunner>,
   registry: DialectRegistry,
   default_dialect: Option<String>,
   interceptors: InterceptorChain,
   safety: SqlSafety,
   count_statements: HashMap<String, String>,
   pool: CountPool,
   contexts: Mutex<HashMap<ContextToken, PageRequest>>,
}

impl PageHelper {
   pub fn builder(runner: Arc<dyn StatementRunner>) -> PageHelperBuilder {
      PageHelperBuilder {
         runner,
         config: PageHelperConfig::default(),
         registry: DialectRegistry::with_builtin(),
         interceptors: InterceptorChain::default(),
         count_statements: HashMap::new(),
      }
   }

   pub fn config(&self) -> &PageHelperConfig {
      &self.inner.config
   }

   pub fn registry(&self) -> &DialectRegistry {
      &self.inner.registry
   }

   /// Dialect resolved at build time, if any.
   pub fn default_dialect(&self) -> Option<&str> {
      self.inner.default_dialect.as_deref()
   }

   /// Maximum number of asynchronous counts running at once.
   pub fn count_workers(&self) -> usize {
      self.inner.pool.size()
   }

   /// Attach `request` for a later [`execute`](Self::execute).
   pub fn attach(&self, request: PageRequest) -> ContextToken {
      let token = ContextToken(Uuid::new_v4());
      self.inner.contexts.lock().insert(token, request);
      debug!(token = %token, "Attached page request");
      token
   }

   /// Remove an attached request. After an execution the returned request
   /// carries the finalized totals.
   pub fn detach(&self, token: &ContextToken) -> Option<PageRequest> {
      let request = self.inner.contexts.lock().remove(token);
      debug!(token = %token, found = request.is_some(), "Detached page request");
      request
   }

   /// Run `statement`, paginated when `token` names an attached request.
   ///
   /// Without a token the statement runs unchanged and plain rows come back.
   pub async fn execute(&self, token: Option<&ContextToken>, statement: Statement) -> Result<QueryOutcome> {
      let Some(token) = token else {
         return self.run_plain(statement).await.map(QueryOutcome::Rows);
      };

      let request = self
         .inner
         .contexts
         .lock()
         .get(token)
         .cloned()
         .ok_or(Error::InvalidContextToken)?;

      let (request, rows) = self.run(request, statement).await?;
      let page = Page::new(&request, rows);
      if let Some(slot) = self.inner.contexts.lock().get_mut(token) {
         *slot = request;
      }
      Ok(QueryOutcome::Page(page))
   }

   /// Count and fetch one page of `statement`.
   pub async fn paginate(&self, request: PageRequest, statement: Statement) -> Result<Page<Row>> {
      let (request, rows) = self.run(request, statement).await?;
      Ok(Page::new(&request, rows))
   }

   /// Fetch the rows selected by an offset and limit.
   ///
   /// Counting follows `bounds.count`, falling back to
   /// `row_bounds_with_count`. With `offset_as_page_num` the offset is read
   /// as a page number.
   pub async fn select_with_bounds(&self, bounds: RowBounds, statement: Statement) -> Result<Page<Row>> {
      let config = &self.inner.config;
      let request = if config.offset_as_page_num && !bounds.is_unbounded() {
         PageRequest::new(bounds.offset, bounds.limit)
      } else {
         PageRequest::from_row_bounds(&bounds)
      };
      let request = request.with_count(bounds.count.unwrap_or(config.row_bounds_with_count));
      self.paginate(request, statement).await
   }

   /// Number of rows `statement` would return, without fetching any.
   pub async fn count(&self, statement: Statement) -> Result<i64> {
      let request = PageRequest::new(1, -1)
         .with_count(true)
         .with_async_count(false);
      let (request, _) = self.run(request, statement).await?;
      Ok(request.total())
   }

   /// Read a request from named parameters, using the configured
   /// parameter names. See [`PageRequest::from_params`].
   pub fn request_from_params(&self, params: &Map<String, JsonValue>) -> Result<Option<PageRequest>> {
      PageRequest::from_params(params, &self.inner.config.params)
   }

   /// Navigation view of `page` using the configured window width.
   pub fn navigation<T>(&self, page: Page<T>) -> NavigationView<T> {
      NavigationView::new(page, self.inner.config.navigate_pages)
   }

   async fn run_plain(&self, statement: Statement) -> Result<Vec<Row>> {
      let inner = &self.inner;
      let mut key = CacheKey::for_statement(&statement);
      let statement = inner
         .interceptors
         .apply(StatementKind::Original, statement, &mut key);
      inner.runner.fetch_rows(&statement, &key).await
   }

   async fn run(&self, mut request: PageRequest, statement: Statement) -> Result<(PageRequest, Vec<Row>)> {
      request.apply_defaults(&self.inner.config);
      request.validate(&self.inner.safety)?;

      let dialect = self.dialect_for(&request)?;
      let mut context = PageContext::new(dialect, request);
      let result = self.drive(&mut context, statement).await;
      context.finish();
      let rows = result?;

      let request = context.request().clone();
      debug!(
         dialect = context.dialect_name(),
         page_no = request.page_no(),
         page_size = request.page_size(),
         total = request.total(),
         rows = rows.len(),
         "Page complete"
      );
      Ok((request, rows))
   }

   async fn drive(&self, context: &mut PageContext, statement: Statement) -> Result<Vec<Row>> {
      let inner = &self.inner;
      let chain = inner.interceptors.then(context.request().interceptors());
      let mut key = CacheKey::for_statement(&statement);
      let statement = chain.apply(StatementKind::Original, statement, &mut key);

      if context.skip() {
         debug!(dialect = context.dialect_name(), "Pagination skipped");
         let rows = inner.runner.fetch_rows(&statement, &key).await?;
         return Ok(context.after_page(rows));
      }

      let mut pending = None;
      if context.before_count() {
         let (count, count_key) = self.count_statement(context, &statement, &key, &chain)?;
         if context.request().is_async_count() {
            pending = Some(
               inner
                  .pool
                  .spawn(Arc::clone(&inner.runner), count, count_key),
            );
         } else {
            let total = inner.runner.fetch_count(&count, &count_key).await?;
            if !context.after_count(total) {
               debug!(
                  total,
                  start_row = context.request().start_row(),
                  "No rows in requested window; page query skipped"
               );
               return Ok(context.after_page(Vec::new()));
            }
         }
      }

      let rows = if context.before_page() {
         let mut page_key = key.clone();
         let page = context.page_statement(&statement, &mut page_key)?;
         let page = chain.apply(StatementKind::Page, page, &mut page_key);
         debug!(dialect = context.dialect_name(), sql = %page.query, "Running page query");
         inner.runner.fetch_rows(&page, &page_key).await?
      } else {
         inner.runner.fetch_rows(&statement, &key).await?
      };

      if let Some(pending) = pending {
         let total = pending.join().await?;
         context.after_count(total);
      }

      Ok(context.after_page(rows))
   }

   fn count_statement(
      &self,
      context: &mut PageContext,
      statement: &Statement,
      key: &CacheKey,
      chain: &InterceptorChain,
   ) -> Result<(Statement, CacheKey)> {
      let inner = &self.inner;
      let manual = statement
         .id
         .as_ref()
         .and_then(|id| inner.count_statements.get(&format!("{id}{}", inner.config.count_suffix)))
         .map(String::as_str);
      if manual.is_some() {
         debug!(id = ?statement.id, "Using registered count statement");
      }

      let mut count_key = key.clone();
      let count = context.count_statement(statement, manual, &mut count_key)?;
      let count = chain.apply(StatementKind::Count, count, &mut count_key);
      debug!(sql = %count.query, "Running count query");
      Ok((count, count_key))
   }

   fn dialect_for(&self, request: &PageRequest) -> Result<Box<dyn Dialect>> {
      let inner = &self.inner;
      if let Some(name) = request.dialect() {
         return inner.registry.resolve(name);
      }
      if let Some(name) = &inner.default_dialect {
         return inner.registry.resolve(name);
      }
      let product = inner
         .runner
         .product_name()
         .ok_or(Error::DialectNotDetected)?;
      let name = inner.registry.detect(&product)?;
      inner.registry.resolve(&name)
   }
}

/// Builder for [`PageHelper`].
pub struct PageHelperBuilder {
   runner: Arc<dyn StatementRunner>,
   config: PageHelperConfig,
   registry: DialectRegistry,
   interceptors: InterceptorChain,
   count_statements: HashMap<String, String>,
}

impl PageHelperBuilder {
   pub fn config(mut self, config: PageHelperConfig) -> Self {
      self.config = config;
      self
   }

   /// Register a custom dialect under `name`.
   pub fn dialect(mut self, name: &str, factory: DialectFactory) -> Self {
      self.registry.register(name, factory);
      self
   }

   /// Interceptor applied to every paginated execution, before any
   /// request-level interceptors.
   pub fn interceptor(mut self, interceptor: impl StatementInterceptor + 'static) -> Self {
      self.interceptors.push(Arc::new(interceptor));
      self
   }

   /// Hand-written count statement, used instead of a derived one for the
   /// statement whose id plus `count_suffix` equals `id`.
   pub fn count_statement(mut self, id: impl Into<String>, query: impl Into<String>) -> Self {
      self.count_statements.insert(id.into(), query.into());
      self
   }

   pub fn build(mut self) -> Result<PageHelper> {
      let safety = SqlSafety::new(&self.config.sql_denylist)?;

      for (alias, target) in &self.config.dialect_alias {
         self.registry.alias(alias, target)?;
      }

      let default_dialect = if self.config.auto_runtime_dialect {
         None
      } else if let Some(name) = &self.config.helper_dialect {
         if !self.registry.contains(name) {
            return Err(Error::UnsupportedDialect(name.clone()));
         }
         Some(name.clone())
      } else {
         match self.runner.product_name() {
            Some(product) => Some(self.registry.detect(&product)?),
            None => None,
         }
      };

      let pool = CountPool::new(self.config.count_pool_size(), self.config.count_timeout());

      debug!(
         dialect = ?default_dialect,
         count_workers = pool.size(),
         interceptors = self.interceptors.len(),
         "Page helper ready"
      );

      Ok(PageHelper {
         inner: Arc::new(Inner {
            config: self.config,
            runner: self.runner,
            registry: self.registry,
            default_dialect,
            interceptors: self.interceptors,
            safety,
            count_statements: self.count_statements,
            pool,
            contexts: Mutex::new(HashMap::new()),
         }),
      })
   }
}
