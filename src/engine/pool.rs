//! engine::pool
//!
//! Bounded worker pool over repositories.
//!
//! Each item runs on a blocking thread (pipelines spawn git processes and
//! hold file locks), at most `jobs` at a time. Results come back in input
//! order regardless of completion order, and a panicking item only loses
//! its own slot.

use std::sync::Arc;

use thiserror::Error;
use tokio::sync::Semaphore;
use tracing::{debug, warn};

/// Errors from the pool itself, never from the work items.
#[derive(Debug, Error)]
pub enum PoolError {
    /// The worker panicked.
    #[error("worker panicked: {0}")]
    Panicked(String),

    /// The worker was cancelled before it finished.
    #[error("worker cancelled")]
    Cancelled,
}

/// Run `f` over every item with at most `jobs` running concurrently.
///
/// `jobs <= 1` runs the items sequentially on the calling thread.
///
/// # Example
///
/// ```
/// use mirrorsync::engine::pool::run_all;
///
/// let doubled = run_all(vec![1, 2, 3], 2, |n| n * 2);
/// let doubled: Vec<i32> = doubled.into_iter().map(Result::unwrap).collect();
/// assert_eq!(doubled, vec![2, 4, 6]);
/// ```
pub fn run_all<T, R, F>(items: Vec<T>, jobs: usize, f: F) -> Vec<Result<R, PoolError>>
where
    T: Send + 'static,
    R: Send + 'static,
    F: Fn(T) -> R + Send + Sync + 'static,
{
    if jobs <= 1 || items.len() <= 1 {
        return items.into_iter().map(|item| Ok(f(item))).collect();
    }

    let runtime = match tokio::runtime::Builder::new_multi_thread()
        .worker_threads(1)
        .max_blocking_threads(jobs)
        .thread_name("mirrorsync-worker")
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            warn!(error = %e, "cannot start worker pool; running sequentially");
            return items.into_iter().map(|item| Ok(f(item))).collect();
        }
    };

    debug!(items = items.len(), jobs, "starting worker pool");
    runtime.block_on(async move {
        let semaphore = Arc::new(Semaphore::new(jobs));
        let f = Arc::new(f);

        let handles: Vec<_> = items
            .into_iter()
            .map(|item| {
                let semaphore = Arc::clone(&semaphore);
                let f = Arc::clone(&f);
                tokio::spawn(async move {
                    let _permit = semaphore
                        .acquire_owned()
                        .await
                        .map_err(|_| PoolError::Cancelled)?;
                    tokio::task::spawn_blocking(move || (*f)(item))
                        .await
                        .map_err(join_error)
                })
            })
            .collect();

        let mut results = Vec::with_capacity(handles.len());
        for handle in handles {
            results.push(match handle.await {
                Ok(result) => result,
                Err(e) => Err(join_error(e)),
            });
        }
        results
    })
}

fn join_error(err: tokio::task::JoinError) -> PoolError {
    if !err.is_panic() {
        return PoolError::Cancelled;
    }
    let payload = err.into_panic();
    let message = payload
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_string());
    PoolError::Panicked(message)
}
