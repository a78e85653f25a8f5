//! Integer adder with contention-adaptive striped storage.
//!
//! This module provides [`LongAdder`], a concurrent `i64` sum optimized
//! for workloads that write far more often than they read. Under no
//! contention it is a single CAS on one word; under contention it
//! stripes updates across cache-line-padded cells and sums them on read.

use std::fmt::Debug;

use crate::adders::{AdderValue, Observable};
use crate::striped::StripedWord;

#[inline]
fn add(a: i64, b: i64) -> i64 {
    a.wrapping_add(b)
}

/// A concurrent `i64` sum that scales with the number of writing threads.
///
/// `LongAdder` starts as a single atomic word. The first time a CAS on
/// that word fails it allocates a two-cell table, and from then on each
/// thread updates a cell picked by a private hash; sustained collisions
/// double the table up to the hardware thread count (rounded up to a
/// power of two). A single-threaded user therefore pays one CAS per
/// `add` and never allocates anything.
///
/// Addition wraps on overflow, matching the behavior of summing the
/// per-cell partials.
///
/// # Reading
///
/// [`sum`](LongAdder::sum) adds up `base` and every cell without
/// stopping writers: the result is exact once writers have quiesced,
/// and a best-effort snapshot otherwise.
///
/// # Examples
///
/// Basic usage:
///
/// ```rust
/// use sommatori::adders::long_adder::LongAdder;
///
/// let counter = LongAdder::new();
/// counter.add(1);
/// counter.add(5);
/// assert_eq!(counter.sum(), 6);
/// ```
///
/// Multi-threaded usage:
///
/// ```rust
/// use sommatori::adders::long_adder::LongAdder;
/// use std::sync::Arc;
/// use std::thread;
///
/// let counter = Arc::new(LongAdder::new());
/// let mut handles = vec![];
///
/// for _ in 0..4 {
///     let c = Arc::clone(&counter);
///     handles.push(thread::spawn(move || {
///         for _ in 0..1000 {
///             c.increment();
///         }
///     }));
/// }
///
/// for h in handles {
///     h.join().unwrap();
/// }
///
/// assert_eq!(counter.sum(), 4000);
/// ```
pub struct LongAdder {
    name: &'static str,
    striped: StripedWord,
}

impl LongAdder {
    /// Creates a new adder with an initial sum of zero.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use sommatori::adders::long_adder::LongAdder;
    ///
    /// let counter = LongAdder::new();
    /// assert_eq!(counter.sum(), 0);
    /// ```
    pub fn new() -> LongAdder {
        LongAdder {
            name: "",
            striped: StripedWord::new(),
        }
    }

    /// Sets the name of this adder, returning `self` for chaining.
    ///
    /// The name identifies the adder in observer output and `Display`
    /// formatting.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use sommatori::adders::long_adder::LongAdder;
    /// use sommatori::adders::Observable;
    ///
    /// let counter = LongAdder::new().with_name("http_requests");
    /// assert_eq!(counter.name(), "http_requests");
    /// ```
    pub fn with_name(self, name: &'static str) -> LongAdder {
        LongAdder { name, ..self }
    }

    /// Adds `x` to the sum.
    ///
    /// Lock-free: while uncontended this is one CAS on the shared base
    /// word; once striped it is one CAS on the calling thread's cell,
    /// with the retry loop entered only when that CAS loses a race.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use sommatori::adders::long_adder::LongAdder;
    ///
    /// let counter = LongAdder::new();
    /// counter.add(5);
    /// counter.add(-2);
    /// assert_eq!(counter.sum(), 3);
    /// ```
    #[inline]
    pub fn add(&self, x: i64) {
        let s = &self.striped;
        if !s.is_striped() {
            let b = s.base();
            if s.cas_base(b, add(b, x)) {
                return;
            }
        }
        match s.probe_cell() {
            Some(cell) => {
                let v = cell.load();
                if !cell.cas(v, add(v, x)) {
                    s.accumulate(x, add, false);
                }
            }
            None => s.accumulate(x, add, true),
        }
    }

    /// Adds one. Equivalent to `add(1)`.
    #[inline]
    pub fn increment(&self) {
        self.add(1);
    }

    /// Subtracts one. Equivalent to `add(-1)`.
    #[inline]
    pub fn decrement(&self) {
        self.add(-1);
    }

    /// Returns the current sum across the base word and every cell.
    ///
    /// The result is exact in the absence of concurrent updates;
    /// concurrent updates may or may not be reflected.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use sommatori::adders::long_adder::LongAdder;
    ///
    /// let counter = LongAdder::new();
    /// counter.add(40);
    /// counter.add(2);
    /// assert_eq!(counter.sum(), 42);
    /// ```
    pub fn sum(&self) -> i64 {
        let mut sum = self.striped.base();
        self.striped
            .for_each_cell(|_, cell| sum = sum.wrapping_add(cell.load()));
        sum
    }

    /// Resets the sum to zero.
    ///
    /// Effective only when no threads are concurrently updating; the
    /// per-component writes are atomic but the reset as a whole is not.
    pub fn reset(&self) {
        self.striped.set_base(0);
        self.striped.for_each_cell(|_, cell| cell.set(0));
    }

    /// Returns the current sum and resets to zero in one pass.
    ///
    /// Each component is drained atomically as it is read, so an update
    /// racing with the drain is counted either in the returned sum or
    /// in the next period, never lost.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use sommatori::adders::long_adder::LongAdder;
    ///
    /// let counter = LongAdder::new();
    /// counter.add(100);
    /// assert_eq!(counter.sum_then_reset(), 100);
    /// assert_eq!(counter.sum(), 0);
    /// ```
    pub fn sum_then_reset(&self) -> i64 {
        let mut sum = self.striped.take_base(0);
        self.striped
            .for_each_cell(|_, cell| sum = sum.wrapping_add(cell.take(0)));
        sum
    }

    /// Number of striped cells currently allocated; 0 while the adder
    /// has never seen contention. Diagnostic only.
    pub fn stripe_count(&self) -> usize {
        self.striped.cells_len()
    }
}

impl Observable for LongAdder {
    #[inline]
    fn name(&self) -> &'static str {
        self.name
    }

    /// Returns the sum as a signed value.
    #[inline]
    fn value(&self) -> AdderValue {
        AdderValue::Signed(self.sum())
    }

    /// Returns the sum and resets to zero.
    #[inline]
    fn value_and_reset(&self) -> AdderValue {
        AdderValue::Signed(self.sum_then_reset())
    }
}

impl Default for LongAdder {
    /// Creates a new adder with sum zero and no name.
    fn default() -> LongAdder {
        LongAdder::new()
    }
}

impl Debug for LongAdder {
    /// Formats the adder showing the base word and every live cell.
    ///
    /// Output format: `name{ base:value [slot]:value ... }`
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}{{ base:{}", self.name, self.striped.base())?;
        self.striped.for_each_cell(|i, cell| {
            let _ = write!(f, " [{i}]:{}", cell.load());
        });
        write!(f, " }}")
    }
}
