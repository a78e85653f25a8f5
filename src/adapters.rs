//! Wrapper types for extending accumulator behavior.
//!
//! This module provides wrappers that add behavior to accumulators while
//! keeping them usable through the
//! [`Observable`](crate::adders::Observable) trait.
//!
//! | Wrapper | Description |
//! |---------|-------------|
//! | [`Resettable`] | Drains the accumulator when `value()` is called — for per-period metrics |
//! | [`Labeled`] | Attaches a `(key, value)` label for dimensional export |
//!
//! # Examples
//!
//! ```rust
//! use sommatori::adders::long_adder::LongAdder;
//! use sommatori::adders::Observable;
//! use sommatori::adapters::Resettable;
//!
//! let per_period = Resettable::new(LongAdder::new().with_name("requests_per_period"));
//! per_period.add(100);
//!
//! // value() returns the sum AND resets it
//! assert_eq!(per_period.value().as_i64(), 100);
//! assert_eq!(per_period.value().as_i64(), 0);
//! ```

mod labeled;
mod resettable;

pub use labeled::Labeled;
pub use resettable::Resettable;
