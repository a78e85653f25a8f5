//! Snapshot types for serializing accumulator state.
//!
//! This module provides serializable point-in-time captures of
//! accumulator values, for storing to files, shipping over HTTP, or
//! handing to another process.
//!
//! # Feature flag
//!
//! Requires the `serde` feature:
//!
//! ```toml
//! [dependencies]
//! sommatori = { version = "0.1", features = ["serde"] }
//! ```
//!
//! # Examples
//!
//! ```rust,ignore
//! use sommatori::adders::long_adder::LongAdder;
//! use sommatori::adders::Observable;
//! use sommatori::snapshot::MetricsSnapshot;
//!
//! let requests = LongAdder::new().with_name("requests");
//! requests.add(42);
//!
//! let counters: Vec<&dyn Observable> = vec![&requests];
//! let snapshot = MetricsSnapshot::collect(counters.into_iter());
//! let json = serde_json::to_string(&snapshot).unwrap();
//! ```

use crate::adders::{AdderValue, Observable};
use serde::{Deserialize, Serialize};

/// A snapshot of a single accumulator's state.
///
/// # Examples
///
/// ```rust
/// use sommatori::adders::AdderValue;
/// use sommatori::snapshot::CounterSnapshot;
///
/// let snapshot = CounterSnapshot::new("requests", AdderValue::Signed(42));
/// assert_eq!(snapshot.name, "requests");
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CounterSnapshot {
    /// The name of the accumulator.
    pub name: String,
    /// Optional label as a (key, value) pair (e.g., ("method", "GET")).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<(String, String)>,
    /// The observed value.
    pub value: AdderValue,
}

impl CounterSnapshot {
    /// Creates a new snapshot.
    pub fn new(name: impl Into<String>, value: AdderValue) -> Self {
        Self {
            name: name.into(),
            label: None,
            value,
        }
    }

    /// Creates a new snapshot with a label.
    pub fn with_label(
        name: impl Into<String>,
        label: Option<(String, String)>,
        value: AdderValue,
    ) -> Self {
        Self {
            name: name.into(),
            label,
            value,
        }
    }

    /// Creates snapshots from an observable accumulator via `expand()`.
    ///
    /// Plain accumulators produce one snapshot; labeled wrappers carry
    /// their label along.
    pub fn from_observable(counter: &dyn Observable) -> Vec<Self> {
        counter
            .expand()
            .into_iter()
            .map(|entry| Self {
                name: if entry.name.is_empty() {
                    "(unnamed)".to_string()
                } else {
                    entry.name.to_string()
                },
                label: entry.label.map(|(k, v)| (k.to_string(), v.to_string())),
                value: entry.value,
            })
            .collect()
    }
}

/// A collection of snapshots, typically a point-in-time capture of all
/// metrics.
///
/// # Examples
///
/// ```rust
/// use sommatori::adders::AdderValue;
/// use sommatori::snapshot::{CounterSnapshot, MetricsSnapshot};
///
/// let snapshot = MetricsSnapshot::new(vec![
///     CounterSnapshot::new("requests", AdderValue::Signed(1000)),
///     CounterSnapshot::new("errors", AdderValue::Signed(5)),
/// ]);
/// assert_eq!(snapshot.get("errors").unwrap().value, AdderValue::Signed(5));
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MetricsSnapshot {
    /// Optional timestamp in milliseconds since the Unix epoch.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp_ms: Option<u64>,
    /// The individual snapshots.
    pub counters: Vec<CounterSnapshot>,
}

impl MetricsSnapshot {
    /// Creates a new metrics snapshot with the given counters.
    pub fn new(counters: Vec<CounterSnapshot>) -> Self {
        Self {
            timestamp_ms: None,
            counters,
        }
    }

    /// Creates a new metrics snapshot with counters and a timestamp.
    pub fn with_timestamp(counters: Vec<CounterSnapshot>, timestamp_ms: u64) -> Self {
        Self {
            timestamp_ms: Some(timestamp_ms),
            counters,
        }
    }

    /// Finds a snapshot by name.
    pub fn get(&self, name: &str) -> Option<&CounterSnapshot> {
        self.counters.iter().find(|c| c.name == name)
    }

    /// Collects snapshots from an iterator of observable accumulators.
    pub fn collect<'a>(counters: impl Iterator<Item = &'a dyn Observable>) -> Self {
        Self::new(
            counters
                .flat_map(CounterSnapshot::from_observable)
                .collect(),
        )
    }

    /// Collects snapshots with a timestamp.
    pub fn collect_with_timestamp<'a>(
        counters: impl Iterator<Item = &'a dyn Observable>,
        timestamp_ms: u64,
    ) -> Self {
        Self::with_timestamp(
            counters
                .flat_map(CounterSnapshot::from_observable)
                .collect(),
            timestamp_ms,
        )
    }
}
