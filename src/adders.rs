//! Accumulator flavors and the shared observation surface.
//!
//! Every type in this module is a thin façade over the same
//! [striping engine](crate::striped): a `base` word for the uncontended
//! case plus a lazily-grown, power-of-two table of cache-line-padded
//! cells for the contended one. The flavors differ only in how the 64-bit
//! cell payload is interpreted and which combiner folds values together:
//!
//! | Type | Payload | Combiner | Use case |
//! |------|---------|----------|----------|
//! | [`LongAdder`](long_adder::LongAdder) | `i64` | wrapping `+` | Event counts, request totals |
//! | [`DoubleAdder`](double_adder::DoubleAdder) | `f64` bits | `+` | Accumulated durations, byte totals in seconds |
//! | [`LongAccumulator`](long_accumulator::LongAccumulator) | `i64` | any associative `fn` | Running max/min, bitwise-or of flags |
//! | [`DoubleAccumulator`](double_accumulator::DoubleAccumulator) | `f64` bits | any associative `fn` | Floating-point reductions |
//!
//! # Reading is a snapshot
//!
//! `sum()`/`get()` fold `base` and every live cell with plain atomic
//! loads, without stopping writers. The result is the value of *some*
//! interleaving, not of a single instant; with no concurrent writers it
//! is exact. `reset()` and the `*_then_reset` variants carry the same
//! caveat across cells.
//!
//! # Thread placement
//!
//! Threads are not assigned slots round-robin; each thread carries a
//! pseudo-random probe that is only seeded once the thread actually
//! contends, and is re-randomized (xorshift) after every collision. A
//! single-threaded workload therefore never allocates the table at all,
//! and the table only grows while collisions keep happening.

pub mod double_accumulator;
pub mod double_adder;
pub mod long_accumulator;
pub mod long_adder;

use std::fmt::{Debug, Display};

/// The value of an accumulator, unified across integer and
/// floating-point flavors.
///
/// # Examples
///
/// ```rust
/// use sommatori::adders::AdderValue;
///
/// assert!(AdderValue::Signed(0).is_zero());
/// assert!(AdderValue::Float(0.0).is_zero());
/// assert!(!AdderValue::Signed(-1).is_zero());
/// assert_eq!(AdderValue::Signed(42).as_f64(), 42.0);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(untagged))]
pub enum AdderValue {
    /// A signed 64-bit total.
    Signed(i64),
    /// A floating-point total.
    Float(f64),
}

impl Display for AdderValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AdderValue::Signed(v) => write!(f, "{}", v),
            AdderValue::Float(v) => write!(f, "{}", v),
        }
    }
}

impl AdderValue {
    /// Returns `true` if the value is zero.
    pub fn is_zero(&self) -> bool {
        match self {
            AdderValue::Signed(v) => *v == 0,
            AdderValue::Float(v) => *v == 0.0,
        }
    }

    /// Returns the value as an `i64`, truncating floats.
    pub fn as_i64(&self) -> i64 {
        match self {
            AdderValue::Signed(v) => *v,
            AdderValue::Float(v) => *v as i64,
        }
    }

    /// Returns the value as an `f64`.
    pub fn as_f64(&self) -> f64 {
        match self {
            AdderValue::Signed(v) => *v as f64,
            AdderValue::Float(v) => *v,
        }
    }
}

/// How an exported metric should be interpreted by a backend.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MetricKind {
    /// A cumulative value; adders report this.
    #[default]
    Counter,
    /// A value that can move in both directions; accumulators report
    /// this (a running max, for instance, restarts from its identity on
    /// reset).
    Gauge,
}

/// One exportable (name, label, value) triple.
///
/// Plain accumulators expand to a single entry;
/// [`Labeled`](crate::adapters::Labeled) wrappers attach the label.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ObservableEntry {
    /// Metric name (empty if the accumulator was never named).
    pub name: &'static str,
    /// Optional `(key, value)` dimension.
    pub label: Option<(&'static str, &'static str)>,
    /// The observed value.
    pub value: AdderValue,
    /// How backends should interpret the value.
    pub metric_kind: MetricKind,
}

/// A trait for types whose aggregate value can be observed and exported.
///
/// All accumulator flavors implement `Observable`, which lets observers
/// ([`observers::table`](crate::observers), json, prometheus) render a
/// heterogeneous set of them through one interface.
///
/// # Examples
///
/// ```rust
/// use sommatori::adders::{AdderValue, Observable};
/// use sommatori::adders::long_adder::LongAdder;
///
/// let requests = LongAdder::new().with_name("requests");
/// requests.add(5);
///
/// println!("{}: {}", requests.name(), requests.value());
/// assert_eq!(requests.value(), AdderValue::Signed(5));
///
/// // Read and reset in one step.
/// assert_eq!(requests.value_and_reset(), AdderValue::Signed(5));
/// assert_eq!(requests.value(), AdderValue::Signed(0));
/// ```
pub trait Observable: Debug {
    /// Returns the name of this accumulator; empty if never named.
    fn name(&self) -> &'static str;

    /// Returns the current aggregate value.
    ///
    /// Folds `base` and every live cell. Concurrent updates may or may
    /// not be included; see the module docs.
    fn value(&self) -> AdderValue;

    /// Returns the aggregate value and resets the accumulator to its
    /// identity.
    ///
    /// Each component is drained atomically, but the operation as a
    /// whole is not atomic across components: an update racing with the
    /// drain lands either in the returned value or in the next period,
    /// never in both and never lost.
    fn value_and_reset(&self) -> AdderValue;

    /// How exporters should classify this metric.
    fn metric_kind(&self) -> MetricKind {
        MetricKind::Counter
    }

    /// Expands this observable into exportable entries.
    fn expand(&self) -> Vec<ObservableEntry> {
        vec![ObservableEntry {
            name: self.name(),
            label: None,
            value: self.value(),
            metric_kind: self.metric_kind(),
        }]
    }
}

impl Display for dyn Observable + '_ {
    /// Formats the accumulator as `name:value` if named, or `value`
    /// otherwise.
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if !self.name().is_empty() {
            write!(f, "{}:{}", self.name(), self.value())
        } else {
            write!(f, "{}", self.value())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::long_adder::LongAdder;
    use super::*;

    #[test]
    fn test_value_display() {
        assert_eq!(AdderValue::Signed(42).to_string(), "42");
        assert_eq!(AdderValue::Signed(-7).to_string(), "-7");
        assert_eq!(AdderValue::Float(1.5).to_string(), "1.5");
    }

    #[test]
    fn test_value_is_zero() {
        assert!(AdderValue::Signed(0).is_zero());
        assert!(AdderValue::Float(0.0).is_zero());
        assert!(!AdderValue::Signed(1).is_zero());
        assert!(!AdderValue::Float(-0.5).is_zero());
    }

    #[test]
    fn test_value_conversions() {
        assert_eq!(AdderValue::Signed(-3).as_f64(), -3.0);
        assert_eq!(AdderValue::Float(2.9).as_i64(), 2);
        assert_eq!(AdderValue::Signed(7).as_i64(), 7);
    }

    #[test]
    fn test_dyn_display_named() {
        let counter = LongAdder::new().with_name("events");
        counter.add(3);
        let formatted = format!("{}", &counter as &dyn Observable);
        assert_eq!(formatted, "events:3");
    }

    #[test]
    fn test_dyn_display_unnamed() {
        let counter = LongAdder::new();
        counter.add(9);
        let formatted = format!("{}", &counter as &dyn Observable);
        assert_eq!(formatted, "9");
    }

    #[test]
    fn test_default_expand() {
        let counter = LongAdder::new().with_name("events");
        counter.add(2);
        let entries = counter.expand();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].name, "events");
        assert_eq!(entries[0].label, None);
        assert_eq!(entries[0].value, AdderValue::Signed(2));
        assert_eq!(entries[0].metric_kind, MetricKind::Counter);
    }
}
