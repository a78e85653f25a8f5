//! Prometheus observer built on the official `prometheus` crate.
//!
//! This module provides [`PrometheusObserver`], which exports a
//! collection of [`Observable`] accumulators through a
//! [`Registry`](prometheus::Registry) and renders them in the Prometheus
//! text exposition format.
//!
//! # Feature flag
//!
//! Requires the `prometheus` feature:
//!
//! ```toml
//! [dependencies]
//! sommatori = { version = "0.1", features = ["prometheus"] }
//! ```
//!
//! # Integration
//!
//! 1. Create a `PrometheusObserver` and configure metric types / help
//!    text as needed.
//! 2. Call [`render`](PrometheusObserver::render) to produce the
//!    exposition string.
//! 3. Serve that string on an HTTP `/metrics` endpoint and point
//!    Prometheus at it.
//!
//! # Examples
//!
//! ```rust,ignore
//! use sommatori::adders::long_adder::LongAdder;
//! use sommatori::adders::Observable;
//! use sommatori::observers::prometheus::PrometheusObserver;
//!
//! let requests = LongAdder::new().with_name("http_requests_total");
//! requests.add(100);
//!
//! let observer = PrometheusObserver::new()
//!     .with_namespace("myapp")
//!     .with_help("http_requests_total", "Total HTTP requests");
//!
//! let counters: Vec<&dyn Observable> = vec![&requests];
//! let output = observer.render(counters.into_iter())?;
//! println!("{}", output);
//! # Ok::<(), sommatori::observers::PrometheusError>(())
//! ```

use crate::adders::{AdderValue, MetricKind, Observable, ObservableEntry};
use crate::observers::PrometheusError;
use prometheus::{Encoder, IntCounter, IntGauge, Registry, TextEncoder};
use std::collections::HashMap;

/// Result type for Prometheus observer operations.
pub type Result<T> = std::result::Result<T, PrometheusError>;

/// Prometheus metric type.
///
/// Determines how a metric is registered and displayed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MetricType {
    /// A cumulative metric that only ever goes up.
    #[default]
    Counter,
    /// A value that can go up and down.
    Gauge,
}

impl From<MetricKind> for MetricType {
    fn from(kind: MetricKind) -> Self {
        match kind {
            MetricKind::Counter => MetricType::Counter,
            MetricKind::Gauge => MetricType::Gauge,
        }
    }
}

/// Configuration for a specific metric.
#[derive(Debug, Clone, Default)]
pub struct MetricConfig {
    /// Overrides the metric type reported by the accumulator.
    pub metric_type: Option<MetricType>,
    /// Help text describing the metric.
    pub help: Option<String>,
    /// Additional labels specific to this metric.
    pub labels: HashMap<String, String>,
}

/// Observer that exports accumulators in the Prometheus text format.
///
/// Each render builds a fresh registry, registers every expanded metric
/// (integer values as `IntCounter`/`IntGauge`, floating-point values as
/// `Counter`/`Gauge`), and encodes it with
/// [`TextEncoder`](prometheus::TextEncoder). The metric type defaults to
/// the accumulator's own [`MetricKind`] and can be overridden per name.
pub struct PrometheusObserver {
    namespace: Option<String>,
    subsystem: Option<String>,
    const_labels: HashMap<String, String>,
    metric_configs: HashMap<String, MetricConfig>,
}

impl Default for PrometheusObserver {
    fn default() -> Self {
        Self::new()
    }
}

impl PrometheusObserver {
    /// Creates a new observer with no namespace and no per-metric
    /// configuration.
    pub fn new() -> Self {
        Self {
            namespace: None,
            subsystem: None,
            const_labels: HashMap::new(),
            metric_configs: HashMap::new(),
        }
    }

    /// Sets the namespace (prefix) for all metrics.
    ///
    /// Namespace "myapp" + metric "requests" renders as
    /// `myapp_requests`.
    pub fn with_namespace(mut self, namespace: &str) -> Self {
        self.namespace = Some(namespace.to_string());
        self
    }

    /// Sets the subsystem, which appears between namespace and metric
    /// name.
    pub fn with_subsystem(mut self, subsystem: &str) -> Self {
        self.subsystem = Some(subsystem.to_string());
        self
    }

    /// Adds a constant label applied to every metric.
    ///
    /// Useful for identifying the instance or environment.
    pub fn with_const_label(mut self, name: &str, value: &str) -> Self {
        self.const_labels
            .insert(name.to_string(), value.to_string());
        self
    }

    /// Configures a specific metric.
    pub fn with_metric_config(mut self, name: &str, config: MetricConfig) -> Self {
        self.metric_configs.insert(name.to_string(), config);
        self
    }

    /// Overrides the metric type for a specific metric.
    pub fn with_type(mut self, name: &str, metric_type: MetricType) -> Self {
        self.metric_configs
            .entry(name.to_string())
            .or_default()
            .metric_type = Some(metric_type);
        self
    }

    /// Sets the help text for a specific metric.
    pub fn with_help(mut self, name: &str, help: &str) -> Self {
        self.metric_configs
            .entry(name.to_string())
            .or_default()
            .help = Some(help.to_string());
        self
    }

    /// Sanitizes a metric name to match `[a-zA-Z_:][a-zA-Z0-9_:]*`.
    fn sanitize_name(name: &str) -> String {
        let mut result = String::with_capacity(name.len());
        for c in name.chars() {
            if c.is_ascii_alphanumeric() || c == '_' || c == ':' {
                result.push(c);
            } else if c == '-' || c == '.' || c == ' ' {
                result.push('_');
            }
        }
        if result.is_empty() {
            result.push_str("unnamed");
        }
        if result
            .chars()
            .next()
            .map(|c| c.is_ascii_digit())
            .unwrap_or(false)
        {
            result.insert(0, '_');
        }
        result
    }

    /// Builds the full metric name with namespace and subsystem.
    fn build_full_name(&self, name: &str) -> String {
        let sanitized = Self::sanitize_name(name);
        match (&self.namespace, &self.subsystem) {
            (Some(ns), Some(ss)) => format!("{}_{}_{}", ns, ss, sanitized),
            (Some(ns), None) => format!("{}_{}", ns, sanitized),
            (None, Some(ss)) => format!("{}_{}", ss, sanitized),
            (None, None) => sanitized,
        }
    }

    /// Renders accumulators to the Prometheus exposition format.
    ///
    /// # Errors
    ///
    /// Returns an error if metric creation, registration, or encoding
    /// fails.
    pub fn render<'a>(&self, counters: impl Iterator<Item = &'a dyn Observable>) -> Result<String> {
        let registry = Registry::new();
        for counter in counters {
            for entry in counter.expand() {
                self.register_entry(&registry, &entry)?;
            }
        }
        self.encode_registry(&registry)
    }

    /// Renders accumulators and drains them in the same pass.
    ///
    /// Every accumulator is read with `value_and_reset()`, so
    /// consecutive calls report per-period values.
    ///
    /// # Errors
    ///
    /// Returns an error if metric creation, registration, or encoding
    /// fails.
    pub fn render_and_reset<'a>(
        &self,
        counters: impl Iterator<Item = &'a dyn Observable>,
    ) -> Result<String> {
        let registry = Registry::new();
        for counter in counters {
            // Drain exactly once, then reuse the expanded entries for
            // their name/label/kind metadata.
            let drained = counter.value_and_reset();
            for mut entry in counter.expand() {
                entry.value = drained;
                self.register_entry(&registry, &entry)?;
            }
        }
        self.encode_registry(&registry)
    }

    /// Renders to bytes, convenient for HTTP responses.
    ///
    /// # Errors
    ///
    /// Returns an error if rendering fails.
    pub fn render_bytes<'a>(
        &self,
        counters: impl Iterator<Item = &'a dyn Observable>,
    ) -> Result<Vec<u8>> {
        Ok(self.render(counters)?.into_bytes())
    }

    fn register_entry(&self, registry: &Registry, entry: &ObservableEntry) -> Result<()> {
        let raw_name = if entry.name.is_empty() {
            "unnamed"
        } else {
            entry.name
        };
        let full_name = self.build_full_name(raw_name);
        let config = self.metric_configs.get(raw_name);
        let metric_type = config
            .and_then(|c| c.metric_type)
            .unwrap_or_else(|| entry.metric_kind.into());
        let help = config
            .and_then(|c| c.help.clone())
            .unwrap_or_else(|| format!("{} metric", raw_name));

        // Merge constant labels, metric-specific labels, and the
        // entry's own dimension.
        let mut labels = self.const_labels.clone();
        if let Some(cfg) = config {
            labels.extend(cfg.labels.clone());
        }
        if let Some((k, v)) = entry.label {
            labels.insert(k.to_string(), v.to_string());
        }

        match metric_type {
            MetricType::Counter => {
                self.register_counter(registry, &full_name, &help, &labels, entry.value)
            }
            MetricType::Gauge => {
                self.register_gauge(registry, &full_name, &help, &labels, entry.value)
            }
        }
    }

    fn encode_registry(&self, registry: &Registry) -> Result<String> {
        let encoder = TextEncoder::new();
        let metric_families = registry.gather();
        let mut buffer = Vec::new();
        encoder
            .encode(&metric_families, &mut buffer)
            .map_err(|e| PrometheusError::EncodeError(e.to_string()))?;
        String::from_utf8(buffer).map_err(PrometheusError::from)
    }

    fn register_counter(
        &self,
        registry: &Registry,
        name: &str,
        help: &str,
        labels: &HashMap<String, String>,
        value: AdderValue,
    ) -> Result<()> {
        match value {
            AdderValue::Signed(v) => {
                // Prometheus counters cannot be negative.
                let v = v.max(0) as u64;
                if labels.is_empty() {
                    let counter = IntCounter::new(name, help)?;
                    counter.inc_by(v);
                    registry.register(Box::new(counter))?;
                } else {
                    let label_names: Vec<&str> = labels.keys().map(|s| s.as_str()).collect();
                    let counter = prometheus::IntCounterVec::new(
                        prometheus::Opts::new(name, help),
                        &label_names,
                    )?;
                    let label_values: Vec<&str> = labels.values().map(|s| s.as_str()).collect();
                    counter.with_label_values(&label_values).inc_by(v);
                    registry.register(Box::new(counter))?;
                }
            }
            AdderValue::Float(v) => {
                let v = v.max(0.0);
                if labels.is_empty() {
                    let counter = prometheus::Counter::new(name, help)?;
                    counter.inc_by(v);
                    registry.register(Box::new(counter))?;
                } else {
                    let label_names: Vec<&str> = labels.keys().map(|s| s.as_str()).collect();
                    let counter = prometheus::CounterVec::new(
                        prometheus::Opts::new(name, help),
                        &label_names,
                    )?;
                    let label_values: Vec<&str> = labels.values().map(|s| s.as_str()).collect();
                    counter.with_label_values(&label_values).inc_by(v);
                    registry.register(Box::new(counter))?;
                }
            }
        }
        Ok(())
    }

    fn register_gauge(
        &self,
        registry: &Registry,
        name: &str,
        help: &str,
        labels: &HashMap<String, String>,
        value: AdderValue,
    ) -> Result<()> {
        match value {
            AdderValue::Signed(v) => {
                if labels.is_empty() {
                    let gauge = IntGauge::new(name, help)?;
                    gauge.set(v);
                    registry.register(Box::new(gauge))?;
                } else {
                    let label_names: Vec<&str> = labels.keys().map(|s| s.as_str()).collect();
                    let gauge = prometheus::IntGaugeVec::new(
                        prometheus::Opts::new(name, help),
                        &label_names,
                    )?;
                    let label_values: Vec<&str> = labels.values().map(|s| s.as_str()).collect();
                    gauge.with_label_values(&label_values).set(v);
                    registry.register(Box::new(gauge))?;
                }
            }
            AdderValue::Float(v) => {
                if labels.is_empty() {
                    let gauge = prometheus::Gauge::new(name, help)?;
                    gauge.set(v);
                    registry.register(Box::new(gauge))?;
                } else {
                    let label_names: Vec<&str> = labels.keys().map(|s| s.as_str()).collect();
                    let gauge = prometheus::GaugeVec::new(
                        prometheus::Opts::new(name, help),
                        &label_names,
                    )?;
                    let label_values: Vec<&str> = labels.values().map(|s| s.as_str()).collect();
                    gauge.with_label_values(&label_values).set(v);
                    registry.register(Box::new(gauge))?;
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::Labeled;
    use crate::adders::double_adder::DoubleAdder;
    use crate::adders::long_accumulator::LongAccumulator;
    use crate::adders::long_adder::LongAdder;

    #[test]
    fn test_render_empty() {
        let observer = PrometheusObserver::new();
        let counters: Vec<&dyn Observable> = vec![];
        let output = observer.render(counters.into_iter()).unwrap();
        assert!(output.is_empty());
    }

    #[test]
    fn test_render_single_counter() {
        let counter = LongAdder::new().with_name("test_counter");
        counter.add(42);

        let observer = PrometheusObserver::new();
        let counters: Vec<&dyn Observable> = vec![&counter];
        let output = observer.render(counters.into_iter()).unwrap();

        assert!(output.contains("test_counter 42"));
        assert!(output.contains("# TYPE test_counter counter"));
    }

    #[test]
    fn test_render_multiple_counters() {
        let counter1 = LongAdder::new().with_name("counter_one");
        let counter2 = LongAdder::new().with_name("counter_two");
        counter1.add(10);
        counter2.add(20);

        let observer = PrometheusObserver::new();
        let counters: Vec<&dyn Observable> = vec![&counter1, &counter2];
        let output = observer.render(counters.into_iter()).unwrap();

        assert!(output.contains("counter_one 10"));
        assert!(output.contains("counter_two 20"));
    }

    #[test]
    fn test_render_with_namespace_and_subsystem() {
        let counter = LongAdder::new().with_name("requests");
        counter.add(100);

        let observer = PrometheusObserver::new()
            .with_namespace("myapp")
            .with_subsystem("http");
        let counters: Vec<&dyn Observable> = vec![&counter];
        let output = observer.render(counters.into_iter()).unwrap();

        assert!(output.contains("myapp_http_requests 100"));
    }

    #[test]
    fn test_render_with_help() {
        let counter = LongAdder::new().with_name("http_requests");
        counter.add(50);

        let observer =
            PrometheusObserver::new().with_help("http_requests", "Total HTTP requests received");
        let counters: Vec<&dyn Observable> = vec![&counter];
        let output = observer.render(counters.into_iter()).unwrap();

        assert!(output.contains("# HELP http_requests Total HTTP requests received"));
        assert!(output.contains("http_requests 50"));
    }

    #[test]
    fn test_accumulator_defaults_to_gauge() {
        let peak = LongAccumulator::new(i64::max, 0).with_name("peak");
        peak.accumulate(25);

        let observer = PrometheusObserver::new();
        let counters: Vec<&dyn Observable> = vec![&peak];
        let output = observer.render(counters.into_iter()).unwrap();

        assert!(output.contains("# TYPE peak gauge"));
        assert!(output.contains("peak 25"));
    }

    #[test]
    fn test_negative_gauge() {
        let gauge = LongAccumulator::new(|a: i64, b: i64| a + b, 0).with_name("delta");
        gauge.accumulate(-50);

        let observer = PrometheusObserver::new();
        let counters: Vec<&dyn Observable> = vec![&gauge];
        let output = observer.render(counters.into_iter()).unwrap();

        assert!(output.contains("delta -50"));
    }

    #[test]
    fn test_float_counter() {
        let seconds = DoubleAdder::new().with_name("busy_seconds");
        seconds.add(1.5);

        let observer = PrometheusObserver::new();
        let counters: Vec<&dyn Observable> = vec![&seconds];
        let output = observer.render(counters.into_iter()).unwrap();

        assert!(output.contains("busy_seconds 1.5"));
    }

    #[test]
    fn test_render_with_const_labels() {
        let counter = LongAdder::new().with_name("requests");
        counter.add(100);

        let observer = PrometheusObserver::new().with_const_label("instance", "localhost:8080");
        let counters: Vec<&dyn Observable> = vec![&counter];
        let output = observer.render(counters.into_iter()).unwrap();

        assert!(output.contains("requests{instance=\"localhost:8080\"} 100"));
    }

    #[test]
    fn test_render_labeled_counter() {
        let counter =
            Labeled::new(LongAdder::new().with_name("http_requests")).with_label("method", "GET");
        counter.add(7);

        let observer = PrometheusObserver::new();
        let counters: Vec<&dyn Observable> = vec![&counter];
        let output = observer.render(counters.into_iter()).unwrap();

        assert!(output.contains("http_requests{method=\"GET\"} 7"));
    }

    #[test]
    fn test_render_and_reset() {
        let counter = LongAdder::new().with_name("resettable");
        counter.add(100);

        let observer = PrometheusObserver::new();
        let counters: Vec<&dyn Observable> = vec![&counter];

        let output1 = observer.render_and_reset(counters.into_iter()).unwrap();
        assert!(output1.contains("resettable 100"));

        let counters: Vec<&dyn Observable> = vec![&counter];
        let output2 = observer.render(counters.into_iter()).unwrap();
        assert!(output2.contains("resettable 0"));
    }

    #[test]
    fn test_negative_counter_clamped_to_zero() {
        let counter = LongAdder::new().with_name("negative_counter");
        counter.add(-100);

        let observer = PrometheusObserver::new();
        let counters: Vec<&dyn Observable> = vec![&counter];
        let output = observer.render(counters.into_iter()).unwrap();

        assert!(output.contains("negative_counter 0"));
    }

    #[test]
    fn test_type_override() {
        let counter = LongAdder::new().with_name("temperature");
        counter.add(25);

        let observer = PrometheusObserver::new().with_type("temperature", MetricType::Gauge);
        let counters: Vec<&dyn Observable> = vec![&counter];
        let output = observer.render(counters.into_iter()).unwrap();

        assert!(output.contains("# TYPE temperature gauge"));
        assert!(output.contains("temperature 25"));
    }

    #[test]
    fn test_sanitize_name() {
        assert_eq!(
            PrometheusObserver::sanitize_name("valid_name"),
            "valid_name"
        );
        assert_eq!(PrometheusObserver::sanitize_name("with-dash"), "with_dash");
        assert_eq!(PrometheusObserver::sanitize_name("with.dot"), "with_dot");
        assert_eq!(PrometheusObserver::sanitize_name(""), "unnamed");
        assert_eq!(
            PrometheusObserver::sanitize_name("123starts"),
            "_123starts"
        );
    }

    #[test]
    fn test_unnamed_counter() {
        let counter = LongAdder::new();
        counter.add(42);

        let observer = PrometheusObserver::new();
        let counters: Vec<&dyn Observable> = vec![&counter];
        let output = observer.render(counters.into_iter()).unwrap();

        assert!(output.contains("unnamed 42"));
    }

    #[test]
    fn test_render_bytes() {
        let counter = LongAdder::new().with_name("bytes_test");
        counter.add(42);

        let observer = PrometheusObserver::new();
        let counters: Vec<&dyn Observable> = vec![&counter];
        let bytes = observer.render_bytes(counters.into_iter()).unwrap();

        let output = String::from_utf8(bytes).unwrap();
        assert!(output.contains("bytes_test 42"));
    }
}
