//! Floating-point adder with contention-adaptive striped storage.
//!
//! This module provides [`DoubleAdder`], the `f64` counterpart of
//! [`LongAdder`](super::long_adder::LongAdder). The striped cells store
//! the bit pattern of the double; every update converts bits → double,
//! adds, and converts back before the CAS, so the cell machinery is
//! shared unchanged with the integer flavor.

use std::fmt::Debug;

use crate::adders::{AdderValue, Observable};
use crate::striped::StripedWord;

/// Adds two doubles carried as i64 bit patterns.
#[inline]
fn add_bits(v: i64, x: i64) -> i64 {
    (f64::from_bits(v as u64) + f64::from_bits(x as u64)).to_bits() as i64
}

/// A concurrent `f64` sum that scales with the number of writing threads.
///
/// `DoubleAdder` has the same adaptive layout as
/// [`LongAdder`](super::long_adder::LongAdder): one base word while
/// uncontended, a growing table of padded cells under contention. The
/// 64-bit payload is the IEEE-754 bit pattern of the partial sum.
///
/// Because floating-point addition is not associative, the aggregate
/// depends on the order in which partials are combined; repeated runs of
/// the same concurrent workload can differ in the last ulps. Totals of
/// exactly-representable values (for example multiples of 0.25) remain
/// exact.
///
/// # Examples
///
/// ```rust
/// use sommatori::adders::double_adder::DoubleAdder;
///
/// let elapsed = DoubleAdder::new().with_name("busy_seconds");
/// elapsed.add(0.25);
/// elapsed.add(1.5);
/// assert_eq!(elapsed.sum(), 1.75);
/// ```
///
/// Multi-threaded usage:
///
/// ```rust
/// use sommatori::adders::double_adder::DoubleAdder;
/// use std::sync::Arc;
/// use std::thread;
///
/// let total = Arc::new(DoubleAdder::new());
/// let mut handles = vec![];
///
/// for _ in 0..4 {
///     let t = Arc::clone(&total);
///     handles.push(thread::spawn(move || {
///         for _ in 0..1000 {
///             t.add(0.25);
///         }
///     }));
/// }
///
/// for h in handles {
///     h.join().unwrap();
/// }
///
/// assert_eq!(total.sum(), 1000.0);
/// ```
pub struct DoubleAdder {
    name: &'static str,
    striped: StripedWord,
}

impl DoubleAdder {
    /// Creates a new adder with an initial sum of `0.0`.
    ///
    /// The zero bit pattern of `f64` is the all-zero word, so the empty
    /// base needs no special encoding.
    pub fn new() -> DoubleAdder {
        DoubleAdder {
            name: "",
            striped: StripedWord::new(),
        }
    }

    /// Sets the name of this adder, returning `self` for chaining.
    pub fn with_name(self, name: &'static str) -> DoubleAdder {
        DoubleAdder { name, ..self }
    }

    /// Adds `x` to the sum.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use sommatori::adders::double_adder::DoubleAdder;
    ///
    /// let total = DoubleAdder::new();
    /// total.add(2.5);
    /// total.add(-1.0);
    /// assert_eq!(total.sum(), 1.5);
    /// ```
    #[inline]
    pub fn add(&self, x: f64) {
        let s = &self.striped;
        let xb = x.to_bits() as i64;
        if !s.is_striped() {
            let b = s.base();
            if s.cas_base(b, add_bits(b, xb)) {
                return;
            }
        }
        match s.probe_cell() {
            Some(cell) => {
                let v = cell.load();
                if !cell.cas(v, add_bits(v, xb)) {
                    s.accumulate(xb, add_bits, false);
                }
            }
            None => s.accumulate(xb, add_bits, true),
        }
    }

    /// Returns the current sum across the base word and every cell.
    ///
    /// Best-effort under concurrent updates, exact once writers have
    /// quiesced (up to floating-point association order).
    pub fn sum(&self) -> f64 {
        let mut sum = f64::from_bits(self.striped.base() as u64);
        self.striped
            .for_each_cell(|_, cell| sum += f64::from_bits(cell.load() as u64));
        sum
    }

    /// Resets the sum to `0.0`.
    ///
    /// Effective only when no threads are concurrently updating.
    pub fn reset(&self) {
        self.striped.set_base(0);
        self.striped.for_each_cell(|_, cell| cell.set(0));
    }

    /// Returns the current sum and resets to `0.0` in one pass.
    pub fn sum_then_reset(&self) -> f64 {
        let mut sum = f64::from_bits(self.striped.take_base(0) as u64);
        self.striped
            .for_each_cell(|_, cell| sum += f64::from_bits(cell.take(0) as u64));
        sum
    }

    /// Number of striped cells currently allocated. Diagnostic only.
    pub fn stripe_count(&self) -> usize {
        self.striped.cells_len()
    }
}

impl Observable for DoubleAdder {
    #[inline]
    fn name(&self) -> &'static str {
        self.name
    }

    #[inline]
    fn value(&self) -> AdderValue {
        AdderValue::Float(self.sum())
    }

    #[inline]
    fn value_and_reset(&self) -> AdderValue {
        AdderValue::Float(self.sum_then_reset())
    }
}

impl Default for DoubleAdder {
    fn default() -> DoubleAdder {
        DoubleAdder::new()
    }
}

impl Debug for DoubleAdder {
    /// Formats the adder showing the base word and every live cell,
    /// decoded as doubles.
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}{{ base:{}",
            self.name,
            f64::from_bits(self.striped.base() as u64)
        )?;
        self.striped.for_each_cell(|i, cell| {
            let _ = write!(f, " [{i}]:{}", f64::from_bits(cell.load() as u64));
        });
        write!(f, " }}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_new() {
        let total = DoubleAdder::new();
        assert_eq!(total.sum(), 0.0);
        assert_eq!(total.stripe_count(), 0);
    }

    #[test]
    fn test_add() {
        let total = DoubleAdder::new();
        total.add(1.5);
        total.add(2.25);
        assert_eq!(total.sum(), 3.75);
    }

    #[test]
    fn test_add_negative() {
        let total = DoubleAdder::new();
        total.add(10.0);
        total.add(-2.5);
        assert_eq!(total.sum(), 7.5);
    }

    #[test]
    fn test_reset() {
        let total = DoubleAdder::new();
        total.add(3.5);
        total.reset();
        assert_eq!(total.sum(), 0.0);
    }

    #[test]
    fn test_sum_then_reset() {
        let total = DoubleAdder::new();
        total.add(1.25);
        total.add(1.25);
        assert_eq!(total.sum_then_reset(), 2.5);
        assert_eq!(total.sum(), 0.0);
    }

    #[test]
    fn test_value_and_reset() {
        let total = DoubleAdder::new();
        total.add(0.5);
        assert_eq!(total.value_and_reset(), AdderValue::Float(0.5));
        assert_eq!(total.value(), AdderValue::Float(0.0));
    }

    #[test]
    fn test_single_thread_never_stripes() {
        let total = DoubleAdder::new();
        for _ in 0..10_000 {
            total.add(0.25);
        }
        assert_eq!(total.sum(), 2500.0);
        assert_eq!(total.stripe_count(), 0);
    }

    #[test]
    fn test_multiple_threads_exact_quarters() {
        // Multiples of 0.25 sum exactly in f64 at this magnitude, so
        // the total is exact regardless of association order.
        let total = Arc::new(DoubleAdder::new());
        let mut handles = vec![];

        for _ in 0..4 {
            let total_clone = Arc::clone(&total);
            handles.push(thread::spawn(move || {
                for _ in 0..100_000 {
                    total_clone.add(0.25);
                }
            }));
        }

        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(total.sum(), 100_000.0);
    }

    #[test]
    fn test_multiple_threads_inexact_values() {
        let total = Arc::new(DoubleAdder::new());
        let mut handles = vec![];

        for _ in 0..4 {
            let total_clone = Arc::clone(&total);
            handles.push(thread::spawn(move || {
                for _ in 0..10_000 {
                    total_clone.add(0.1);
                }
            }));
        }

        for handle in handles {
            handle.join().unwrap();
        }

        let sum = total.sum();
        assert!((sum - 4_000.0).abs() < 1e-6, "sum drifted too far: {sum}");
    }

    #[test]
    fn test_with_name() {
        let total = DoubleAdder::new().with_name("seconds");
        assert_eq!(total.name(), "seconds");
    }

    #[test]
    fn test_default() {
        let total = DoubleAdder::default();
        assert_eq!(total.sum(), 0.0);
        assert_eq!(total.name(), "");
    }

    #[test]
    fn test_debug() {
        let total = DoubleAdder::new().with_name("dbg");
        total.add(1.5);
        let debug_str = format!("{:?}", total);
        assert!(debug_str.starts_with("dbg{"));
        assert!(debug_str.contains("1.5"));
    }
}
