//! Property-based tests for retry policies and snapshot composition

mod composite_snapshot;
