//! Resettable wrapper for accumulators that drain on observation.
//!
//! This module provides [`Resettable`], a wrapper that swaps the plain
//! `value()` for the drain-style `value_and_reset()`. Useful when a
//! collector scrapes per-period deltas (requests this interval, bytes
//! since the last report) instead of cumulative totals.

use crate::adders::{AdderValue, MetricKind, Observable, ObservableEntry};
use std::fmt::{self, Debug};
use std::ops::Deref;

/// A wrapper that resets an accumulator whenever `value()` is called.
///
/// The wrapped accumulator's drain carries the usual weak-consistency
/// caveat: an update racing with the drain lands either in the returned
/// value or in the next period, never in both and never lost.
///
/// # Examples
///
/// ```rust
/// use sommatori::adders::long_adder::LongAdder;
/// use sommatori::adders::Observable;
/// use sommatori::adapters::Resettable;
///
/// let requests = Resettable::new(LongAdder::new().with_name("requests"));
/// requests.add(50);
/// requests.add(50);
///
/// // Reading returns the sum and starts a fresh period.
/// assert_eq!(requests.value().as_i64(), 100);
/// assert_eq!(requests.value().as_i64(), 0);
///
/// requests.add(25);
/// assert_eq!(requests.value().as_i64(), 25);
/// ```
///
/// # Using with observers
///
/// When rendered by an observer, a `Resettable` accumulator is drained on
/// every `render()` call, so consecutive renders report per-period values
/// while unwrapped accumulators next to it keep reporting cumulative
/// totals.
pub struct Resettable<T> {
    inner: T,
}

impl<T> Resettable<T> {
    /// Creates a new resettable wrapper around the given accumulator.
    pub const fn new(inner: T) -> Resettable<T> {
        Resettable { inner }
    }

    /// Returns a reference to the inner accumulator.
    pub fn inner(&self) -> &T {
        &self.inner
    }

    /// Consumes the wrapper and returns the inner accumulator.
    pub fn into_inner(self) -> T {
        self.inner
    }
}

impl<T: Observable> Observable for Resettable<T> {
    fn name(&self) -> &'static str {
        self.inner.name()
    }

    /// Returns the current value AND resets the accumulator.
    fn value(&self) -> AdderValue {
        self.inner.value_and_reset()
    }

    fn value_and_reset(&self) -> AdderValue {
        self.inner.value_and_reset()
    }

    fn metric_kind(&self) -> MetricKind {
        self.inner.metric_kind()
    }

    fn expand(&self) -> Vec<ObservableEntry> {
        vec![ObservableEntry {
            name: self.inner.name(),
            label: None,
            value: self.inner.value_and_reset(),
            metric_kind: self.inner.metric_kind(),
        }]
    }
}

impl<T: Debug> Debug for Resettable<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Resettable")
            .field("inner", &self.inner)
            .finish()
    }
}

/// Allows transparent access to the inner accumulator's methods.
impl<T> Deref for Resettable<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.inner
    }
}

// DerefMut is intentionally absent: mutating through the wrapper could
// bypass the drain-on-read contract.
