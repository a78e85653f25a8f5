//! # Sommatori - Contention-Adaptive Striped Accumulators
//!
//! A Rust library providing thread-safe 64-bit sums and reductions that
//! are written far more often than they are read. The accumulators in
//! this crate implement **dynamic striping**: they begin life as one
//! atomic word and transparently spread themselves across cache-line
//! padded cells only when contention actually shows up.
//!
//! ## The Problem
//!
//! In multi-threaded applications, a naive shared counter is a single
//! atomic variable. While correct, every increment bounces the cache
//! line holding the counter between cores, because each core must take
//! exclusive ownership of it. The more threads and the hotter the
//! counter, the worse it gets: a one-instruction operation becomes a
//! cross-core tug of war.
//!
//! ## The Solution: Adaptive Striping
//!
//! Instead of paying for scalability up front, an accumulator here
//! *adapts*:
//!
//! 1. **Quiet start.** All updates CAS a single `base` word. A
//!    single-threaded user never allocates anything and pays one CAS
//!    per update.
//! 2. **Contention detection.** A failed CAS is the signal. The first
//!    failure allocates a table of two padded cells.
//! 3. **Per-thread routing.** Each thread carries a lazily-seeded
//!    pseudo-random probe that picks its cell; after every collision
//!    the probe is re-randomized with an xorshift step, so colliding
//!    threads walk apart (double hashing).
//! 4. **Bounded growth.** Two consecutive unresolved collisions double
//!    the table, up to the number of hardware threads rounded up to a
//!    power of two. The table never shrinks and cells are never
//!    evicted; workloads that contended once tend to contend again.
//!
//! Reads aggregate `base` plus all cells without locking. That makes a
//! read a weakly-consistent snapshot — the deliberate trade this design
//! makes for write scalability.
//!
//! ## Available Accumulators
//!
//! | Type | Description | Use case |
//! |------|-------------|----------|
//! | [`LongAdder`](adders::long_adder::LongAdder) | Concurrent `i64` sum | Event counts, request totals |
//! | [`DoubleAdder`](adders::double_adder::DoubleAdder) | Concurrent `f64` sum | Accumulated durations, sampled ratios |
//! | [`LongAccumulator`](adders::long_accumulator::LongAccumulator) | `i64` fold under any associative combiner | Running max/min, flag unions |
//! | [`DoubleAccumulator`](adders::double_accumulator::DoubleAccumulator) | `f64` fold under any associative combiner | Floating-point reductions |
//!
//! ## Quick Start
//!
//! ```rust
//! use sommatori::adders::long_adder::LongAdder;
//! use std::sync::Arc;
//! use std::thread;
//!
//! let hits = Arc::new(LongAdder::new().with_name("hits"));
//!
//! let handles: Vec<_> = (0..4)
//!     .map(|_| {
//!         let hits = Arc::clone(&hits);
//!         thread::spawn(move || {
//!             for _ in 0..10_000 {
//!                 hits.increment();
//!             }
//!         })
//!     })
//!     .collect();
//!
//! for h in handles {
//!     h.join().unwrap();
//! }
//!
//! assert_eq!(hits.sum(), 40_000);
//!
//! // Read and start a fresh period in one pass.
//! assert_eq!(hits.sum_then_reset(), 40_000);
//! assert_eq!(hits.sum(), 0);
//! ```
//!
//! ## Thread Safety
//!
//! All accumulators are `Send + Sync` and meant to be shared through
//! `Arc` (or `static`s holding them). Writers never block: structural
//! changes (allocating or growing the cell table) are guarded by a spin
//! flag that is only ever *try*-acquired — a writer that cannot take it
//! immediately updates some other cell or the base word instead of
//! waiting.
//!
//! ## Memory Usage
//!
//! An uncontended accumulator is a few machine words. A contended one
//! grows to at most `nextPow2(hardware threads)` cells of one padded
//! cache line each (128 bytes) — on an 8-core machine that tops out
//! around 1 KiB, allocated only if the contention actually happened.
//!
//! ## Consistency Caveats
//!
//! `sum()`/`get()` fold the components with plain atomic loads while
//! writers keep writing; the result is exact only once writers have
//! quiesced. `reset()` is likewise not atomic across components. The
//! `*_then_reset` variants drain each component atomically as they go,
//! so racing updates land either in the returned value or in the next
//! period — never in both, never lost.
//!
//! ## Observers
//!
//! The library provides optional observer modules for exporting
//! accumulator values, each behind a feature flag:
//!
//! | Feature | Module | Description |
//! |---------|--------|-------------|
//! | `table` | [`observers::table`] | Pretty-print as ASCII tables |
//! | `json` | [`observers::json`] | Serialize snapshots to JSON |
//! | `prometheus` | [`observers::prometheus`] | Prometheus exposition format |
//! | `serde` | [`snapshot`] | Serializable snapshot types |
//! | `full` | All of the above | |
//!
//! ### Example: Prometheus Output
//!
//! ```toml
//! [dependencies]
//! sommatori = { version = "0.1", features = ["prometheus"] }
//! ```
//!
//! ```rust,ignore
//! use sommatori::adders::long_adder::LongAdder;
//! use sommatori::adders::Observable;
//! use sommatori::observers::prometheus::PrometheusObserver;
//!
//! let requests = LongAdder::new().with_name("http_requests_total");
//! requests.add(1000);
//!
//! let counters: Vec<&dyn Observable> = vec![&requests];
//! let output = PrometheusObserver::new()
//!     .with_namespace("myapp")
//!     .render(counters.into_iter())?;
//! ```

pub mod adapters;
pub mod adders;
pub mod observers;
mod striped;

#[cfg(feature = "serde")]
pub mod snapshot;
