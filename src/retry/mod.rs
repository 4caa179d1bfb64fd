//! Retry
//!
//! [`RetryPolicy`] maps the number of a failed attempt to the wait before the
//! next one; [`AsyncRetryExecutor`] drives work through those waits without
//! blocking a thread.

mod executor;
mod policy;

pub use executor::{AbortPredicate, AsyncRetryExecutor};
pub use policy::{
    backoff, fixed_duration, Backoff, FixedDelay, Jittered, MaxRetries, RetryPolicy,
    RetryPolicyExt,
};
