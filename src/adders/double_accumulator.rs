//! Floating-point reduction with an arbitrary combiner and striped
//! storage.
//!
//! This module provides [`DoubleAccumulator`], the `f64` counterpart of
//! [`LongAccumulator`](super::long_accumulator::LongAccumulator). Cells
//! carry the IEEE-754 bit pattern; the combiner runs on decoded doubles
//! and the result is re-encoded before the CAS.

use std::fmt::Debug;

use crate::adders::{AdderValue, MetricKind, Observable};
use crate::striped::StripedWord;

#[inline]
fn to_bits(x: f64) -> i64 {
    x.to_bits() as i64
}

#[inline]
fn from_bits(v: i64) -> f64 {
    f64::from_bits(v as u64)
}

/// A concurrent `f64` reduction under a caller-supplied combiner.
///
/// The combiner must be associative and side-effect free; contended
/// updates are folded into per-thread cells in an unspecified grouping.
/// Floating-point operations are rarely exactly associative, so the
/// aggregate may differ across runs in the low-order bits even for a
/// commutative combiner like `+` — `max` and `min` are exact.
///
/// # Examples
///
/// A running maximum of observed temperatures:
///
/// ```rust
/// use sommatori::adders::double_accumulator::DoubleAccumulator;
///
/// let peak = DoubleAccumulator::new(f64::max, f64::NEG_INFINITY).with_name("temp_peak");
/// peak.accumulate(21.5);
/// peak.accumulate(19.0);
/// peak.accumulate(23.75);
/// assert_eq!(peak.get(), 23.75);
/// ```
pub struct DoubleAccumulator<F> {
    name: &'static str,
    func: F,
    identity: f64,
    striped: StripedWord,
}

impl<F> DoubleAccumulator<F>
where
    F: Fn(f64, f64) -> f64 + Send + Sync,
{
    /// Creates a new accumulator with the given combiner and identity.
    pub fn new(func: F, identity: f64) -> DoubleAccumulator<F> {
        DoubleAccumulator {
            name: "",
            func,
            identity,
            striped: StripedWord::with_base(to_bits(identity)),
        }
    }

    /// Sets the name of this accumulator, returning `self` for chaining.
    pub fn with_name(self, name: &'static str) -> DoubleAccumulator<F> {
        DoubleAccumulator { name, ..self }
    }

    /// Folds `x` into the accumulator.
    #[inline]
    pub fn accumulate(&self, x: f64) {
        let s = &self.striped;
        let xb = to_bits(x);
        let apply = |v: i64, xb: i64| to_bits((self.func)(from_bits(v), from_bits(xb)));
        if !s.is_striped() {
            let b = s.base();
            let r = apply(b, xb);
            if r == b || s.cas_base(b, r) {
                return;
            }
        }
        match s.probe_cell() {
            Some(cell) => {
                let v = cell.load();
                let r = apply(v, xb);
                if r != v && !cell.cas(v, r) {
                    s.accumulate(xb, apply, false);
                }
            }
            None => s.accumulate(xb, apply, true),
        }
    }

    /// Returns the fold of the base word and every cell under the
    /// combiner.
    pub fn get(&self) -> f64 {
        let mut result = from_bits(self.striped.base());
        self.striped
            .for_each_cell(|_, cell| result = (self.func)(result, from_bits(cell.load())));
        result
    }

    /// Resets every component to the identity.
    ///
    /// Effective only when no threads are concurrently updating.
    pub fn reset(&self) {
        let identity = to_bits(self.identity);
        self.striped.set_base(identity);
        self.striped.for_each_cell(|_, cell| cell.set(identity));
    }

    /// Returns the current fold and resets to the identity in one pass.
    pub fn get_then_reset(&self) -> f64 {
        let identity = to_bits(self.identity);
        let mut result = from_bits(self.striped.take_base(identity));
        self.striped
            .for_each_cell(|_, cell| result = (self.func)(result, from_bits(cell.take(identity))));
        result
    }

    /// Number of striped cells currently allocated. Diagnostic only.
    pub fn stripe_count(&self) -> usize {
        self.striped.cells_len()
    }
}

impl<F> Observable for DoubleAccumulator<F>
where
    F: Fn(f64, f64) -> f64 + Send + Sync,
{
    #[inline]
    fn name(&self) -> &'static str {
        self.name
    }

    #[inline]
    fn value(&self) -> AdderValue {
        AdderValue::Float(self.get())
    }

    #[inline]
    fn value_and_reset(&self) -> AdderValue {
        AdderValue::Float(self.get_then_reset())
    }

    fn metric_kind(&self) -> MetricKind {
        MetricKind::Gauge
    }
}

impl<F> Debug for DoubleAccumulator<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}{{ base:{}", self.name, from_bits(self.striped.base()))?;
        self.striped.for_each_cell(|i, cell| {
            let _ = write!(f, " [{i}]:{}", from_bits(cell.load()));
        });
        write!(f, " }}")
    }
}
