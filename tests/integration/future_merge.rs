//! Merging task handles from real pools

use futures::FutureExt;
use std::collections::{BTreeMap, HashMap};
use std::time::Duration;
use threadstate::concurrent::{delay, into_option, merge, merge_map, merge_map_into, TaskResultExt};
use threadstate::error::TaskError;
use threadstate::executor::{DirectExecutor, ExecutorServiceExt, ScheduledExecutorExt, TokioPool};

#[tokio::test(flavor = "multi_thread")]
async fn test_merge_preserves_submission_order() {
    let pool = TokioPool::current("merge").unwrap();

    // Later submissions finish first.
    let handles: Vec<_> = (0..5u64)
        .map(|index| {
            pool.schedule_task(Duration::from_millis(50 - index * 10), move || Ok(index))
                .unwrap()
        })
        .collect();

    assert_eq!(merge(handles).await.unwrap(), vec![0, 1, 2, 3, 4]);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_merge_failure_is_unwrapped_by_caller() {
    let pool = TokioPool::current("merge").unwrap();
    let handles = vec![
        pool.submit(|| Ok(1)).unwrap(),
        pool.submit(|| Err(TaskError::failed("lost"))).unwrap(),
    ];

    let err = merge(handles).await.with_unwrapped_cause().unwrap_err();
    assert!(matches!(err, TaskError::Failed(_)));
}

#[test]
fn test_merge_pending_until_all_resolve() {
    let executor = DirectExecutor::new();
    let ready = executor.submit(|| Ok(1)).unwrap();
    let (tx, rx) = tokio::sync::oneshot::channel::<u32>();
    let waiting = async move { rx.await.map_err(|_| TaskError::Cancelled) }.boxed();

    let mut merged = Box::pin(merge(vec![ready.boxed(), waiting]));
    assert!((&mut merged).now_or_never().is_none());

    tx.send(2).unwrap();
    assert_eq!(merged.now_or_never().unwrap().unwrap(), vec![1, 2]);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_merge_map_over_handles() {
    let pool = TokioPool::current("keyed").unwrap();
    let mut handles = HashMap::new();
    for name in ["alpha", "beta", "gamma"] {
        handles.insert(name, pool.submit(move || Ok(name.len())).unwrap());
    }

    let lengths = merge_map(handles).await.unwrap();
    assert_eq!(lengths["alpha"], 5);
    assert_eq!(lengths["beta"], 4);
    assert_eq!(lengths["gamma"], 5);

    let ordered: BTreeMap<&str, usize> = merge_map_into(vec![
        ("b", pool.submit(|| Ok(2)).unwrap()),
        ("a", pool.submit(|| Ok(1)).unwrap()),
    ])
    .await
    .unwrap();
    assert_eq!(ordered.keys().copied().collect::<Vec<_>>(), vec!["a", "b"]);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_delay_and_into_option() {
    let pool = TokioPool::current("timer").unwrap();

    delay(&pool, Duration::from_millis(5)).unwrap().await.unwrap();

    let failed = pool.submit(|| Err::<u8, _>(TaskError::failed("gone"))).unwrap();
    assert_eq!(into_option(failed).await, None);
    let succeeded = pool.submit(|| Ok(9u8)).unwrap();
    assert_eq!(into_option(succeeded).await, Some(9));
}
