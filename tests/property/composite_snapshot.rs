//! Ordering and exactly-once laws of composite snapshots

use parking_lot::Mutex;
use proptest::prelude::*;
use std::sync::Arc;
use threadstate::context::{CompositeSnapshot, ContextSnapshot};
use threadstate::error::ContextError;

type Log = Arc<Mutex<Vec<String>>>;

struct Recorded {
    index: usize,
    log: Log,
    fail_restore: bool,
}

impl ContextSnapshot for Recorded {
    fn restore(&mut self) -> Result<(), ContextError> {
        self.log.lock().push(format!("restore:{}", self.index));
        if self.fail_restore {
            return Err(ContextError::restore(self.index.to_string(), "refused"));
        }
        Ok(())
    }

    fn cleanup(&mut self) -> Result<(), ContextError> {
        self.log.lock().push(format!("cleanup:{}", self.index));
        Ok(())
    }
}

fn composite(len: usize, failing: Option<usize>, log: &Log) -> CompositeSnapshot {
    CompositeSnapshot::new(
        (0..len)
            .map(|index| {
                Box::new(Recorded {
                    index,
                    log: Arc::clone(log),
                    fail_restore: failing == Some(index),
                }) as Box<dyn ContextSnapshot>
            })
            .collect(),
    )
}

/// Cleanup called any number of times has the effect of calling it once
#[test]
fn test_cleanup_idempotence() {
    let mut runner = proptest::test_runner::TestRunner::default();

    runner
        .run(&(1usize..10, 1usize..5), |(len, repeats)| {
            let log: Log = Arc::new(Mutex::new(Vec::new()));
            let mut snapshot = composite(len, None, &log);
            snapshot.restore().unwrap();
            for _ in 0..repeats {
                snapshot.cleanup().unwrap();
            }

            let expected: Vec<String> = (0..len)
                .map(|i| format!("restore:{}", i))
                .chain((0..len).rev().map(|i| format!("cleanup:{}", i)))
                .collect();
            prop_assert_eq!(log.lock().clone(), expected);
            Ok(())
        })
        .unwrap();
}

/// A restore failure at `k` cleans `k..=0` in reverse and nothing after `k`
#[test]
fn test_restore_failure_unwinds_prefix() {
    let mut runner = proptest::test_runner::TestRunner::default();

    runner
        .run(
            &(1usize..10).prop_flat_map(|len| (Just(len), 0..len)),
            |(len, failing)| {
                let log: Log = Arc::new(Mutex::new(Vec::new()));
                let mut snapshot = composite(len, Some(failing), &log);

                prop_assert!(snapshot.restore().is_err());
                snapshot.cleanup().unwrap();

                let expected: Vec<String> = (0..=failing)
                    .map(|i| format!("restore:{}", i))
                    .chain((0..=failing).rev().map(|i| format!("cleanup:{}", i)))
                    .collect();
                prop_assert_eq!(log.lock().clone(), expected);
                Ok(())
            },
        )
        .unwrap();
}
