//! Integer reduction with an arbitrary combiner and striped storage.
//!
//! This module provides [`LongAccumulator`], which generalizes
//! [`LongAdder`](super::long_adder::LongAdder) from addition to any
//! associative combiner with an identity: running maxima and minima,
//! bitwise-or of flag sets, saturating sums, and so on.

use std::fmt::Debug;

use crate::adders::{AdderValue, MetricKind, Observable};
use crate::striped::StripedWord;

/// A concurrent `i64` reduction under a caller-supplied combiner.
///
/// The combiner must be associative and side-effect free, because
/// contended updates are folded into per-thread cells in an unspecified
/// grouping and the aggregate is the fold of `base` and every cell. If
/// the combiner is also commutative the aggregate is independent of
/// interleaving; otherwise it is the fold of *some* ordering of the
/// contributed values.
///
/// `identity` is the empty value: the initial base, and what every
/// component is restored to by [`reset`](LongAccumulator::reset).
///
/// A panicking combiner propagates to the caller before any CAS is
/// attempted, so no partial update is left behind.
///
/// # Examples
///
/// A running maximum:
///
/// ```rust
/// use sommatori::adders::long_accumulator::LongAccumulator;
///
/// let max_latency = LongAccumulator::new(i64::max, i64::MIN).with_name("latency_max");
/// max_latency.accumulate(150);
/// max_latency.accumulate(85);
/// max_latency.accumulate(200);
/// assert_eq!(max_latency.get(), 200);
/// ```
///
/// Flag accumulation with bitwise-or:
///
/// ```rust
/// use sommatori::adders::long_accumulator::LongAccumulator;
///
/// let seen = LongAccumulator::new(|a, b| a | b, 0);
/// seen.accumulate(0b0001);
/// seen.accumulate(0b0100);
/// assert_eq!(seen.get(), 0b0101);
/// ```
pub struct LongAccumulator<F> {
    name: &'static str,
    func: F,
    identity: i64,
    striped: StripedWord,
}

impl<F> LongAccumulator<F>
where
    F: Fn(i64, i64) -> i64 + Send + Sync,
{
    /// Creates a new accumulator with the given combiner and identity.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use sommatori::adders::long_accumulator::LongAccumulator;
    ///
    /// let min = LongAccumulator::new(i64::min, i64::MAX);
    /// assert_eq!(min.get(), i64::MAX);
    /// ```
    pub fn new(func: F, identity: i64) -> LongAccumulator<F> {
        LongAccumulator {
            name: "",
            func,
            identity,
            striped: StripedWord::with_base(identity),
        }
    }

    /// Sets the name of this accumulator, returning `self` for chaining.
    pub fn with_name(self, name: &'static str) -> LongAccumulator<F> {
        LongAccumulator { name, ..self }
    }

    /// Folds `x` into the accumulator.
    ///
    /// When the combined value equals the current one (a max that did
    /// not increase, for instance) the CAS is skipped entirely.
    #[inline]
    pub fn accumulate(&self, x: i64) {
        let s = &self.striped;
        if !s.is_striped() {
            let b = s.base();
            let r = (self.func)(b, x);
            if r == b || s.cas_base(b, r) {
                return;
            }
        }
        match s.probe_cell() {
            Some(cell) => {
                let v = cell.load();
                let r = (self.func)(v, x);
                if r != v && !cell.cas(v, r) {
                    s.accumulate(x, |a, b| (self.func)(a, b), false);
                }
            }
            None => s.accumulate(x, |a, b| (self.func)(a, b), true),
        }
    }

    /// Returns the fold of the base word and every cell under the
    /// combiner.
    ///
    /// Best-effort under concurrent updates, exact once writers have
    /// quiesced.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use sommatori::adders::long_accumulator::LongAccumulator;
    ///
    /// let max = LongAccumulator::new(i64::max, i64::MIN);
    /// max.accumulate(3);
    /// max.accumulate(11);
    /// assert_eq!(max.get(), 11);
    /// ```
    pub fn get(&self) -> i64 {
        let mut result = self.striped.base();
        self.striped
            .for_each_cell(|_, cell| result = (self.func)(result, cell.load()));
        result
    }

    /// Resets every component to the identity.
    ///
    /// Effective only when no threads are concurrently updating.
    pub fn reset(&self) {
        self.striped.set_base(self.identity);
        let identity = self.identity;
        self.striped.for_each_cell(|_, cell| cell.set(identity));
    }

    /// Returns the current fold and resets to the identity in one pass.
    pub fn get_then_reset(&self) -> i64 {
        let identity = self.identity;
        let mut result = self.striped.take_base(identity);
        self.striped
            .for_each_cell(|_, cell| result = (self.func)(result, cell.take(identity)));
        result
    }

    /// Number of striped cells currently allocated. Diagnostic only.
    pub fn stripe_count(&self) -> usize {
        self.striped.cells_len()
    }
}

impl<F> Observable for LongAccumulator<F>
where
    F: Fn(i64, i64) -> i64 + Send + Sync,
{
    #[inline]
    fn name(&self) -> &'static str {
        self.name
    }

    #[inline]
    fn value(&self) -> AdderValue {
        AdderValue::Signed(self.get())
    }

    #[inline]
    fn value_and_reset(&self) -> AdderValue {
        AdderValue::Signed(self.get_then_reset())
    }

    /// Accumulators restart from their identity on reset, so backends
    /// should treat them as gauges.
    fn metric_kind(&self) -> MetricKind {
        MetricKind::Gauge
    }
}

impl<F> Debug for LongAccumulator<F> {
    /// Formats the accumulator showing the base word and every live
    /// cell.
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}{{ base:{}", self.name, self.striped.base())?;
        self.striped.for_each_cell(|i, cell| {
            let _ = write!(f, " [{i}]:{}", cell.load());
        });
        write!(f, " }}")
    }
}
