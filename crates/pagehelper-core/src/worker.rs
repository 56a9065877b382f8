//! Bounded pool for count queries that run alongside the page query.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Semaphore;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::runner::StatementRunner;
use crate::statement::{CacheKey, Statement};
use crate::{Error, Result};

/// Admits at most `size` count queries at once; later ones queue for a
/// permit.
#[derive(Debug, Clone)]
pub(crate) struct CountPool {
   permits: Arc<Semaphore>,
   size: usize,
   timeout: Option<Duration>,
}

impl CountPool {
   pub(crate) fn new(size: usize, timeout: Option<Duration>) -> Self {
      Self {
         permits: Arc::new(Semaphore::new(size)),
         size,
         timeout,
      }
   }

   pub(crate) fn size(&self) -> usize {
      self.size
   }

   /// Start the count on a separate task. Must be called from within a
   /// Tokio runtime.
   pub(crate) fn spawn(
      &self,
      runner: Arc<dyn StatementRunner>,
      statement: Statement,
      key: CacheKey,
   ) -> PendingCount {
      let permits = Arc::clone(&self.permits);
      let handle = tokio::spawn(async move {
         let _permit = permits
            .acquire_owned()
            .await
            .map_err(|_| Error::CountTaskFailed("count pool is closed".to_string()))?;
         debug!(sql = %statement.query, "Running count on worker");
         runner.fetch_count(&statement, &key).await
      });

      PendingCount {
         handle,
         timeout: self.timeout,
      }
   }
}

/// Handle to a running count. Dropping it aborts the task, so a failed page
/// query never leaves a count running.
pub(crate) struct PendingCount {
   handle: JoinHandle<Result<i64>>,
   timeout: Option<Duration>,
}

impl PendingCount {
   pub(crate) async fn join(mut self) -> Result<i64> {
      let joined = match self.timeout {
         Some(limit) => match tokio::time::timeout(limit, &mut self.handle).await {
            Ok(joined) => joined,
            Err(_) => {
               warn!(timeout = ?limit, "Count query timed out; aborting");
               self.handle.abort();
               return Err(Error::CountTimeout(limit));
            }
         },
         None => (&mut self.handle).await,
      };

      match joined {
         Ok(result) => result,
         Err(e) => Err(Error::CountTaskFailed(e.to_string())),
      }
   }
}

impl Drop for PendingCount {
   fn drop(&mut self) {
      self.handle.abort();
   }
}

#[cfg(test)]
mod tests {
   use std::sync::atomic::{AtomicUsize, Ordering};

   use futures::future::BoxFuture;

   use super::*;
   use crate::statement::Row;

   #[derive(Default)]
   struct SlowCounter {
      running: AtomicUsize,
      peak: AtomicUsize,
      delay: Duration,
   }

   impl StatementRunner for SlowCounter {
      fn fetch_rows<'a>(&'a self, _: &'a Statement, _: &'a CacheKey) -> BoxFuture<'a, Result<Vec<Row>>> {
         Box::pin(async { Ok(Vec::new()) })
      }

      fn fetch_count<'a>(&'a self, _: &'a Statement, _: &'a CacheKey) -> BoxFuture<'a, Result<i64>> {
         Box::pin(async move {
            let now = self.running.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
            tokio::time::sleep(self.delay).await;
            self.running.fetch_sub(1, Ordering::SeqCst);
            Ok(7)
         })
      }
   }

   fn count_statement() -> (Statement, CacheKey) {
      let statement = Statement::new("SELECT COUNT(0) FROM t", vec![]);
      let key = CacheKey::for_statement(&statement);
      (statement, key)
   }

   #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
   async fn pool_bounds_concurrency() {
      let runner = Arc::new(SlowCounter {
         delay: Duration::from_millis(30),
         ..Default::default()
      });
      let pool = CountPool::new(2, None);

      let pending: Vec<_> = (0..6)
         .map(|_| {
            let (statement, key) = count_statement();
            pool.spawn(runner.clone(), statement, key)
         })
         .collect();

      for count in pending {
         assert_eq!(count.join().await.unwrap(), 7);
      }
      assert!(runner.peak.load(Ordering::SeqCst) <= 2);
      assert_eq!(pool.size(), 2);
   }

   #[tokio::test]
   async fn timeout_aborts() {
      let runner = Arc::new(SlowCounter {
         delay: Duration::from_secs(5),
         ..Default::default()
      });
      let pool = CountPool::new(1, Some(Duration::from_millis(20)));
      let (statement, key) = count_statement();

      let err = pool.spawn(runner, statement, key).join().await.unwrap_err();
      assert!(matches!(err, Error::CountTimeout(_)));
   }

   #[tokio::test]
   async fn dropping_releases_permit() {
      let runner = Arc::new(SlowCounter {
         delay: Duration::from_secs(5),
         ..Default::default()
      });
      let pool = CountPool::new(1, Some(Duration::from_millis(500)));

      let (statement, key) = count_statement();
      drop(pool.spawn(runner.clone(), statement, key));
      tokio::task::yield_now().await;

      let quick = Arc::new(SlowCounter::default());
      let (statement, key) = count_statement();
      assert_eq!(pool.spawn(quick, statement, key).join().await.unwrap(), 7);
   }
}
