//! Observer implementations for collecting and exporting accumulator
//! values.
//!
//! This module provides several ways to observe and export accumulators:
//!
//! - [`table`] - Pretty-print accumulators as tables using the `tabled` crate
//! - [`json`] - Serialize snapshots to JSON
//! - [`prometheus`] - Export in the Prometheus exposition format
//!
//! # Unified error handling
//!
//! All observers share the [`ObserverError`] type, so switching between
//! backends does not change error handling code.
//!
//! # Feature flags
//!
//! Each observer is gated behind a feature to keep the dependency tree
//! minimal:
//!
//! - `table` - enables the [`table`] module
//! - `json` - enables the [`json`] module (implies `serde`)
//! - `prometheus` - enables the [`prometheus`] module
//! - `full` - enables everything
//!
//! # Example
//!
//! ```rust,ignore
//! use sommatori::adders::Observable;
//! use sommatori::adders::long_adder::LongAdder;
//! use sommatori::observers::Result;
//!
//! fn export_metrics(counters: &[&dyn Observable]) -> Result<()> {
//!     #[cfg(feature = "prometheus")]
//!     {
//!         use sommatori::observers::prometheus::PrometheusObserver;
//!         let observer = PrometheusObserver::new();
//!         println!("{}", observer.render(counters.iter().copied())?);
//!     }
//!     Ok(())
//! }
//! ```

mod error;

pub use error::{ObserverError, Result};

#[cfg(feature = "prometheus")]
pub use error::PrometheusError;

#[cfg(feature = "table")]
pub mod table;

#[cfg(feature = "json")]
pub mod json;

#[cfg(feature = "prometheus")]
pub mod prometheus;
