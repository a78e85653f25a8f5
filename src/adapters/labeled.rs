//! Labeled wrapper for adding a dimension to accumulators.
//!
//! This module provides [`Labeled`], a wrapper that attaches a
//! `(key, value)` label to an accumulator. Labels become metric
//! dimensions in exporters — the Prometheus observer renders a labeled
//! counter as `name{key="value"} n`.

use crate::adders::{AdderValue, MetricKind, Observable, ObservableEntry};
use std::fmt::{self, Debug};
use std::ops::Deref;

/// A wrapper that attaches a label (a key-value tag) to an accumulator.
///
/// Several `Labeled` wrappers around separately-striped accumulators
/// with the same name model one dimensional metric:
///
/// ```rust
/// use sommatori::adders::long_adder::LongAdder;
/// use sommatori::adders::Observable;
/// use sommatori::adapters::Labeled;
///
/// let get_requests = Labeled::new(LongAdder::new().with_name("http_requests"))
///     .with_label("method", "GET");
/// let post_requests = Labeled::new(LongAdder::new().with_name("http_requests"))
///     .with_label("method", "POST");
///
/// get_requests.add(100);
/// post_requests.add(50);
///
/// assert_eq!(get_requests.get_label("method"), Some("GET"));
/// assert_eq!(get_requests.value().as_i64(), 100);
/// ```
pub struct Labeled<T> {
    inner: T,
    label: Option<(&'static str, &'static str)>,
}

impl<T> Labeled<T> {
    /// Creates a labeled wrapper with no label set yet.
    pub const fn new(inner: T) -> Labeled<T> {
        Labeled { inner, label: None }
    }

    /// Sets the label; a second call replaces the first.
    pub fn with_label(mut self, key: &'static str, value: &'static str) -> Labeled<T> {
        self.label = Some((key, value));
        self
    }

    /// Returns the label value for `key`, if that is the label's key.
    pub fn get_label(&self, key: &str) -> Option<&'static str> {
        match self.label {
            Some((k, v)) if k == key => Some(v),
            _ => None,
        }
    }

    /// Returns the label pair, if set.
    pub fn label(&self) -> Option<(&'static str, &'static str)> {
        self.label
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

impl<T: Observable> Observable for Labeled<T> {
    fn name(&self) -> &'static str {
        self.inner.name()
    }

    fn value(&self) -> AdderValue {
        self.inner.value()
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
            label: self.label,
            value: self.inner.value(),
            metric_kind: self.inner.metric_kind(),
        }]
    }
}

impl<T: Debug> Debug for Labeled<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Labeled")
            .field("label", &self.label)
            .field("inner", &self.inner)
            .finish()
    }
}

/// Allows transparent access to the inner accumulator's methods.
impl<T> Deref for Labeled<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.inner
    }
}
