//! JSON observer for serializing accumulators.
//!
//! This module provides [`JsonObserver`], which serializes a collection
//! of [`Observable`] accumulators to JSON via the
//! [`snapshot`](crate::snapshot) types.
//!
//! # Feature flag
//!
//! Requires the `json` feature (which implies `serde`):
//!
//! ```toml
//! [dependencies]
//! sommatori = { version = "0.1", features = ["json"] }
//! ```
//!
//! # Examples
//!
//! ```rust,ignore
//! use sommatori::adders::long_adder::LongAdder;
//! use sommatori::adders::Observable;
//! use sommatori::observers::json::JsonObserver;
//!
//! let requests = LongAdder::new().with_name("http_requests");
//! let errors = LongAdder::new().with_name("http_errors");
//!
//! requests.add(1000);
//! errors.add(5);
//!
//! let counters: Vec<&dyn Observable> = vec![&requests, &errors];
//!
//! let json = JsonObserver::new().to_json(counters.into_iter()).unwrap();
//! println!("{}", json);
//! // {"counters":[{"name":"http_requests","value":1000},{"name":"http_errors","value":5}]}
//! ```

use crate::adders::Observable;
use crate::observers::Result;
use crate::snapshot::MetricsSnapshot;

/// Observer that serializes accumulators to JSON.
///
/// The output is a [`MetricsSnapshot`]: an optional timestamp plus one
/// entry per expanded metric.
#[derive(Debug, Clone, Default)]
pub struct JsonObserver {
    pretty: bool,
    timestamp_ms: Option<u64>,
}

impl JsonObserver {
    /// Creates a new JSON observer producing compact output.
    pub fn new() -> Self {
        Self::default()
    }

    /// Enables or disables pretty-printed output.
    ///
    /// # Examples
    ///
    /// ```rust,ignore
    /// let json = JsonObserver::new()
    ///     .pretty(true)
    ///     .to_json(counters.into_iter())?;
    /// ```
    pub fn pretty(mut self, enabled: bool) -> Self {
        self.pretty = enabled;
        self
    }

    /// Stamps the snapshot with a timestamp (milliseconds since the
    /// Unix epoch).
    pub fn with_timestamp(mut self, timestamp_ms: u64) -> Self {
        self.timestamp_ms = Some(timestamp_ms);
        self
    }

    /// Captures a snapshot of the accumulators.
    pub fn snapshot<'a>(
        &self,
        counters: impl Iterator<Item = &'a dyn Observable>,
    ) -> MetricsSnapshot {
        match self.timestamp_ms {
            Some(ts) => MetricsSnapshot::collect_with_timestamp(counters, ts),
            None => MetricsSnapshot::collect(counters),
        }
    }

    /// Serializes the accumulators to a JSON string.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json<'a>(&self, counters: impl Iterator<Item = &'a dyn Observable>) -> Result<String> {
        let snapshot = self.snapshot(counters);
        let json = if self.pretty {
            serde_json::to_string_pretty(&snapshot)?
        } else {
            serde_json::to_string(&snapshot)?
        };
        Ok(json)
    }

    /// Serializes the accumulators directly to a writer.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or writing fails.
    pub fn to_writer<'a, W: std::io::Write>(
        &self,
        writer: W,
        counters: impl Iterator<Item = &'a dyn Observable>,
    ) -> Result<()> {
        let snapshot = self.snapshot(counters);
        if self.pretty {
            serde_json::to_writer_pretty(writer, &snapshot)?;
        } else {
            serde_json::to_writer(writer, &snapshot)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::{Labeled, Resettable};
    use crate::adders::double_adder::DoubleAdder;
    use crate::adders::long_adder::LongAdder;
    use crate::adders::AdderValue;

    #[test]
    fn test_to_json_empty() {
        let observer = JsonObserver::new();
        let counters: Vec<&dyn Observable> = vec![];
        let json = observer.to_json(counters.into_iter()).unwrap();
        assert_eq!(json, r#"{"counters":[]}"#);
    }

    #[test]
    fn test_to_json_single_counter() {
        let counter = LongAdder::new().with_name("requests");
        counter.add(1000);

        let observer = JsonObserver::new();
        let counters: Vec<&dyn Observable> = vec![&counter];
        let json = observer.to_json(counters.into_iter()).unwrap();

        assert!(json.contains(r#""name":"requests""#));
        assert!(json.contains(r#""value":1000"#));
    }

    #[test]
    fn test_to_json_float_counter() {
        let total = DoubleAdder::new().with_name("seconds");
        total.add(1.5);

        let observer = JsonObserver::new();
        let counters: Vec<&dyn Observable> = vec![&total];
        let json = observer.to_json(counters.into_iter()).unwrap();

        assert!(json.contains(r#""value":1.5"#));
    }

    #[test]
    fn test_to_json_pretty() {
        let counter = LongAdder::new().with_name("requests");
        counter.add(1);

        let observer = JsonObserver::new().pretty(true);
        let counters: Vec<&dyn Observable> = vec![&counter];
        let json = observer.to_json(counters.into_iter()).unwrap();

        assert!(json.contains('\n'));
        assert!(json.contains("requests"));
    }

    #[test]
    fn test_to_json_with_timestamp() {
        let counter = LongAdder::new().with_name("x");
        counter.add(1);

        let observer = JsonObserver::new().with_timestamp(1234567890);
        let counters: Vec<&dyn Observable> = vec![&counter];
        let json = observer.to_json(counters.into_iter()).unwrap();

        assert!(json.contains(r#""timestamp_ms":1234567890"#));
    }

    #[test]
    fn test_to_json_labeled() {
        let counter =
            Labeled::new(LongAdder::new().with_name("reqs")).with_label("method", "GET");
        counter.add(2);

        let observer = JsonObserver::new();
        let counters: Vec<&dyn Observable> = vec![&counter];
        let json = observer.to_json(counters.into_iter()).unwrap();

        assert!(json.contains(r#""label":["method","GET"]"#));
    }

    #[test]
    fn test_to_json_resettable_drains() {
        let counter = Resettable::new(LongAdder::new().with_name("period"));
        counter.add(9);

        let observer = JsonObserver::new();
        let counters: Vec<&dyn Observable> = vec![&counter];
        let json = observer.to_json(counters.into_iter()).unwrap();

        assert!(json.contains(r#""value":9"#));
        assert_eq!(counter.value(), AdderValue::Signed(0));
    }

    #[test]
    fn test_snapshot_roundtrip() {
        let counter = LongAdder::new().with_name("events");
        counter.add(5);

        let observer = JsonObserver::new();
        let counters: Vec<&dyn Observable> = vec![&counter];
        let snapshot = observer.snapshot(counters.into_iter());

        let json = serde_json::to_string(&snapshot).unwrap();
        let back: MetricsSnapshot = serde_json::from_str(&json).unwrap();
        assert_eq!(snapshot, back);
    }

    #[test]
    fn test_to_writer() {
        let counter = LongAdder::new().with_name("events");
        counter.add(3);

        let observer = JsonObserver::new();
        let counters: Vec<&dyn Observable> = vec![&counter];
        let mut buffer = Vec::new();
        observer
            .to_writer(&mut buffer, counters.into_iter())
            .unwrap();

        let json = String::from_utf8(buffer).unwrap();
        assert!(json.contains("events"));
    }
}
