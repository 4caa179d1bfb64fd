//! Retry orchestration against a real tokio runtime

use super::test_utils::{Counter, CountingPool};
use std::sync::Arc;
use std::time::Duration;
use threadstate::error::TaskError;
use threadstate::retry::{fixed_duration, AsyncRetryExecutor, RetryPolicy, RetryPolicyExt};

const WAIT: Duration = Duration::from_millis(10);

/// Policy that answers from `answers` in order and counts how often it is asked.
fn scripted_policy(answers: Vec<Option<Duration>>, asked: Counter) -> Arc<dyn RetryPolicy> {
    Arc::new(move |_attempt: u32| {
        let call = asked.bump();
        answers.get(call - 1).copied().flatten()
    })
}

fn orchestrator(
    pool: &CountingPool,
    policy: Arc<dyn RetryPolicy>,
    predicate_calls: Counter,
    abort_from_call: Option<usize>,
) -> AsyncRetryExecutor {
    AsyncRetryExecutor::new(Arc::new(pool.clone()), policy).with_abort_predicate(move |_| {
        let call = predicate_calls.bump();
        abort_from_call.is_some_and(|from| call >= from)
    })
}

#[tokio::test(flavor = "multi_thread")]
async fn test_no_retry_on_success() {
    let pool = CountingPool::current("retry");
    let (invocations, policy_calls, predicate_calls) = (Counter::new(), Counter::new(), Counter::new());
    let retry = orchestrator(
        &pool,
        scripted_policy(vec![Some(WAIT)], policy_calls.clone()),
        predicate_calls.clone(),
        None,
    );

    let calls = invocations.clone();
    let value = retry
        .execute(move || {
            calls.bump();
            Ok("supplied")
        })
        .await
        .unwrap();

    assert_eq!(value, "supplied");
    assert_eq!(invocations.get(), 1);
    assert_eq!(policy_calls.get(), 0);
    assert_eq!(predicate_calls.get(), 0);
    assert_eq!(pool.scheduled(), 0);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_retry_then_succeed() {
    let pool = CountingPool::current("retry");
    let (invocations, predicate_calls) = (Counter::new(), Counter::new());
    let retry = orchestrator(
        &pool,
        Arc::new(fixed_duration(WAIT).with_max_retry_count(2)),
        predicate_calls.clone(),
        None,
    );

    let calls = invocations.clone();
    let value = retry
        .execute(move || {
            if calls.bump() <= 2 {
                return Err(TaskError::failed("transient"));
            }
            Ok(42)
        })
        .await
        .unwrap();

    assert_eq!(value, 42);
    assert_eq!(invocations.get(), 3);
    assert_eq!(predicate_calls.get(), 2);
    assert_eq!(pool.scheduled(), 2);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_recurrent_failure_exhausts() {
    let pool = CountingPool::current("retry");
    let (invocations, policy_calls, predicate_calls) = (Counter::new(), Counter::new(), Counter::new());
    let retry = orchestrator(
        &pool,
        scripted_policy(vec![Some(WAIT), Some(WAIT), None], policy_calls.clone()),
        predicate_calls.clone(),
        None,
    );

    let calls = invocations.clone();
    let err = retry
        .execute(move || -> Result<(), TaskError> {
            calls.bump();
            Err(TaskError::failed("still down"))
        })
        .await
        .unwrap_err();

    match err {
        TaskError::Exhausted { attempts, cause } => {
            assert_eq!(attempts, 3);
            assert_eq!(cause.to_string(), "Task failed: still down");
        }
        other => panic!("expected exhaustion, got {other}"),
    }
    assert_eq!(invocations.get(), 3);
    assert_eq!(policy_calls.get(), 3);
    assert_eq!(predicate_calls.get(), 3);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_abort_predicate_stops_retries() {
    let pool = CountingPool::current("retry");
    let (invocations, policy_calls, predicate_calls) = (Counter::new(), Counter::new(), Counter::new());
    let retry = orchestrator(
        &pool,
        scripted_policy(vec![Some(WAIT); 10], policy_calls.clone()),
        predicate_calls.clone(),
        Some(2),
    );

    let calls = invocations.clone();
    let err = retry
        .execute(move || -> Result<(), TaskError> {
            calls.bump();
            Err(TaskError::failed("bad request"))
        })
        .await
        .unwrap_err();

    assert!(matches!(err, TaskError::Aborted { .. }));
    assert!(matches!(err.cause(), Some(TaskError::Failed(_))));
    assert_eq!(invocations.get(), 2);
    assert_eq!(predicate_calls.get(), 2);
    assert_eq!(policy_calls.get(), 1);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_abort_on_first_failure_ignores_budget() {
    let pool = CountingPool::current("retry");
    let (invocations, predicate_calls) = (Counter::new(), Counter::new());
    let retry = orchestrator(
        &pool,
        Arc::new(fixed_duration(WAIT).with_max_retry_count(100)),
        predicate_calls.clone(),
        Some(1),
    );

    let calls = invocations.clone();
    let err = retry
        .execute(move || -> Result<(), TaskError> {
            calls.bump();
            Err(TaskError::failed("forbidden"))
        })
        .await
        .unwrap_err();

    assert!(matches!(err, TaskError::Aborted { .. }));
    assert_eq!(invocations.get(), 1);
    assert_eq!(pool.scheduled(), 0);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_panic_aborts_without_consulting_predicate() {
    let pool = CountingPool::current("retry");
    let (invocations, policy_calls, predicate_calls) = (Counter::new(), Counter::new(), Counter::new());
    let retry = orchestrator(
        &pool,
        scripted_policy(vec![Some(WAIT)], policy_calls.clone()),
        predicate_calls.clone(),
        None,
    );

    let calls = invocations.clone();
    let err = retry
        .execute(move || -> Result<(), TaskError> {
            calls.bump();
            panic!("invariant violated");
        })
        .await
        .unwrap_err();

    assert!(matches!(
        err.cause(),
        Some(TaskError::Panicked(message)) if message == "invariant violated"
    ));
    assert!(matches!(err, TaskError::Aborted { .. }));
    assert_eq!(invocations.get(), 1);
    assert_eq!(predicate_calls.get(), 0);
    assert_eq!(policy_calls.get(), 0);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_first_attempt_on_primary_retries_on_retry_pool() {
    let scheduler = CountingPool::current("scheduler");
    let primary = CountingPool::current("primary");
    let retry_pool = CountingPool::current("retry");
    let retry = AsyncRetryExecutor::with_executors(
        Arc::new(scheduler.clone()),
        Arc::new(primary.clone()),
        Arc::new(retry_pool.clone()),
        Arc::new(fixed_duration(Duration::from_millis(1)).with_max_retry_count(5)),
    );

    let invocations = Counter::new();
    let calls = invocations.clone();
    let value = retry
        .execute(move || {
            let call = calls.bump();
            if call < 4 {
                return Err(TaskError::failed("warming up"));
            }
            Ok(call)
        })
        .await
        .unwrap();

    assert_eq!(value, 4);
    assert_eq!(primary.executed(), 1);
    assert_eq!(retry_pool.executed(), 3);
    assert_eq!(scheduler.scheduled(), 3);
    assert_eq!(scheduler.executed(), 0);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_concurrent_invocations_are_independent() {
    let pool = CountingPool::current("retry");
    let retry = AsyncRetryExecutor::new(
        Arc::new(pool.clone()),
        Arc::new(fixed_duration(Duration::from_millis(2)).with_max_retry_count(3)),
    );

    let handles: Vec<_> = (0..8)
        .map(|index: usize| {
            let calls = Counter::new();
            retry.execute(move || {
                if calls.bump() <= index % 3 {
                    return Err(TaskError::failed("flaky"));
                }
                Ok(index)
            })
        })
        .collect();

    let values = threadstate::concurrent::merge(handles).await.unwrap();
    assert_eq!(values, (0..8).collect::<Vec<_>>());
}

#[tokio::test(flavor = "multi_thread")]
async fn test_abort_predicate_sees_unwrapped_cause() {
    let pool = CountingPool::current("retry");
    let (invocations, predicate_calls) = (Counter::new(), Counter::new());
    let seen_by_predicate = predicate_calls.clone();
    let retry = AsyncRetryExecutor::new(
        Arc::new(pool.clone()),
        Arc::new(fixed_duration(WAIT).with_max_retry_count(5)),
    )
    .with_abort_predicate(move |cause| {
        seen_by_predicate.bump();
        matches!(cause, TaskError::Rejected(_))
    });

    let calls = invocations.clone();
    let err = retry
        .execute(move || -> Result<(), TaskError> {
            calls.bump();
            Err(TaskError::Completion(Box::new(TaskError::Rejected(
                "queue full".into(),
            ))))
        })
        .await
        .unwrap_err();

    assert!(matches!(err, TaskError::Aborted { .. }));
    assert!(matches!(err.cause(), Some(TaskError::Rejected(_))));
    assert_eq!(invocations.get(), 1);
    assert_eq!(predicate_calls.get(), 1);
    assert_eq!(pool.scheduled(), 0);
}
