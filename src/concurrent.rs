//! Combinators for composing asynchronous task results.

use crate::error::TaskError;
use crate::executor::{ScheduledExecutor, ScheduledExecutorExt, TaskHandle};
use futures::future::try_join_all;
use std::collections::HashMap;
use std::future::Future;
use std::hash::Hash;
use std::time::Duration;
use tracing::debug;

/// Resolve every future, keeping input order.
///
/// Fails with the first failure observed without waiting for the rest. An
/// empty input resolves immediately to an empty vector.
pub async fn merge<I, T, E>(futures: I) -> Result<Vec<T>, E>
where
    I: IntoIterator,
    I::Item: Future<Output = Result<T, E>>,
{
    try_join_all(futures).await
}

/// Keyed [`merge`].
pub async fn merge_map<K, F, T, E>(futures: HashMap<K, F>) -> Result<HashMap<K, T>, E>
where
    K: Eq + Hash,
    F: Future<Output = Result<T, E>>,
{
    merge_map_into(futures).await
}

/// Keyed [`merge`] collecting into a map type chosen by the caller.
pub async fn merge_map_into<M, I, K, F, T, E>(futures: I) -> Result<M, E>
where
    I: IntoIterator<Item = (K, F)>,
    F: Future<Output = Result<T, E>>,
    M: FromIterator<(K, T)>,
{
    let (keys, futures): (Vec<K>, Vec<F>) = futures.into_iter().unzip();
    let values = try_join_all(futures).await?;
    Ok(keys.into_iter().zip(values).collect())
}

/// Strip the asynchronous envelope so callers see the real failure.
pub fn unwrap_cause(error: TaskError) -> TaskError {
    error.into_cause()
}

/// Put a failure in the asynchronous envelope, unless it already is.
pub fn wrap_completion(error: TaskError) -> TaskError {
    match error {
        TaskError::Completion(_) => error,
        other => TaskError::Completion(Box::new(other)),
    }
}

/// Future resolving once `duration` has passed on the scheduler's timer.
pub fn delay<S>(scheduler: &S, duration: Duration) -> Result<TaskHandle<()>, TaskError>
where
    S: ScheduledExecutor + ?Sized,
{
    scheduler.schedule_task(duration, || Ok(()))
}

/// Resolve to `None` instead of failing.
pub async fn into_option<F, T>(future: F) -> Option<T>
where
    F: Future<Output = Result<T, TaskError>>,
{
    match future.await {
        Ok(value) => Some(value),
        Err(e) => {
            debug!(error = %e, "Discarding failed result");
            None
        }
    }
}

pub trait TaskResultExt<T> {
    fn with_unwrapped_cause(self) -> Result<T, TaskError>;
}

impl<T> TaskResultExt<T> for Result<T, TaskError> {
    fn with_unwrapped_cause(self) -> Result<T, TaskError> {
        self.map_err(unwrap_cause)
    }
}
