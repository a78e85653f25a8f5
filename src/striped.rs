//! The dynamic striping engine shared by every accumulator flavor.
//!
//! A [`StripedWord`] is a single logical 64-bit value that adapts its
//! physical layout to the contention it observes:
//!
//! 1. With no contention, every update is a CAS on one `base` word.
//! 2. The first failed CAS on `base` lazily allocates a table of two
//!    cache-line-padded cells and routes the update there.
//! 3. Each thread picks its cell with a private pseudo-random probe;
//!    a failed CAS on a cell rehashes the probe (xorshift) and retries.
//! 4. Two consecutive unresolved collisions double the table, up to the
//!    number of hardware threads rounded up to a power of two.
//!
//! ```text
//!            no contention                 sustained contention
//!   add ──► CAS(base) ✓            add ──► cells[(n-1) & probe] ── CAS ✓
//!                                            │ CAS ✗
//!                                            ▼
//!                                   rehash probe, maybe grow table
//! ```
//!
//! Structural transitions (table init, growth, attaching a cell to an
//! empty slot) are serialized by `cells_busy`, a 0/1 spin flag that is
//! only ever try-acquired: a writer that cannot take it immediately does
//! something else productive (another slot, or `base`) instead of
//! waiting. The flag's critical sections contain only allocation and
//! pointer assignment; user combiners never run under it.
//!
//! # Consistency
//!
//! Readers sum `base` plus every live cell with plain atomic loads and no
//! locking, so an aggregate read is a weakly-consistent snapshot: updates
//! concurrent with the read may or may not be included. This is the
//! documented trade of the whole crate — write scalability over read
//! atomicity.
//!
//! # Memory
//!
//! The table only ever grows, and cells are never reclaimed while the
//! accumulator lives: a thread that once contended may contend again, and
//! a stale table pointer held by a reader must stay dereferenceable.
//! Grown-out tables are threaded on a `prev` chain and freed, together
//! with the cells, when the `StripedWord` is dropped.

use std::ptr;
use std::sync::atomic::{AtomicI64, AtomicPtr, AtomicU32, Ordering};
use std::sync::OnceLock;

use crossbeam_utils::CachePadded;

/// Hardware threads available to the process, sampled once.
///
/// `available_parallelism` costs microseconds, so the answer is cached
/// for every accumulator constructed afterwards.
pub(crate) fn ncpu() -> usize {
    static NCPU: OnceLock<usize> = OnceLock::new();
    *NCPU.get_or_init(|| {
        std::thread::available_parallelism()
            .map(Into::into)
            .unwrap_or(1)
    })
}

/// A single 64-bit accumulator cell, padded to its own cache line.
///
/// Cells live in an array; without padding they would be packed
/// adjacently and every CAS would invalidate the neighbors' lines.
/// `CachePadded` aligns to 128 bytes on x86_64 and aarch64, covering
/// adjacent-line prefetch.
///
/// The only write primitive is `cas`; the striping loop never blindly
/// stores into a live cell.
pub(crate) struct Cell {
    value: CachePadded<AtomicI64>,
}

impl Cell {
    fn new(x: i64) -> Self {
        Cell {
            value: CachePadded::new(AtomicI64::new(x)),
        }
    }

    #[inline]
    pub(crate) fn load(&self) -> i64 {
        self.value.load(Ordering::Acquire)
    }

    #[inline]
    pub(crate) fn cas(&self, cmp: i64, val: i64) -> bool {
        self.value
            .compare_exchange(cmp, val, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    /// Plain store, used only by quiescent-style resets.
    #[inline]
    pub(crate) fn set(&self, val: i64) {
        self.value.store(val, Ordering::Release);
    }

    /// Reads the cell and writes `replacement` back in one atomic step.
    #[inline]
    pub(crate) fn take(&self, replacement: i64) -> i64 {
        self.value.swap(replacement, Ordering::AcqRel)
    }
}

/// A power-of-two table of lazily-attached cells.
///
/// Slots start null and are assigned at most one cell for the table's
/// whole lifetime; growth copies the cell pointers into a table twice the
/// length and retires the old one on the `prev` chain.
struct CellTable {
    slots: Box<[AtomicPtr<Cell>]>,
    /// Previous (smaller) table, kept alive until the accumulator drops
    /// so that readers holding a stale pointer stay safe.
    prev: *mut CellTable,
}

impl CellTable {
    fn with_len(len: usize) -> CellTable {
        debug_assert!(len.is_power_of_two());
        CellTable {
            slots: (0..len).map(|_| AtomicPtr::new(ptr::null_mut())).collect(),
            prev: ptr::null_mut(),
        }
    }
}

/// Per-thread probe: the pseudo-random hash that picks a thread's cell.
///
/// Zero means "never contended"; the probe is seeded lazily on first
/// contention and advanced by a Marsaglia xorshift step after every
/// collision, so colliding threads walk different retry sequences
/// (double hashing).
mod probe {
    use std::cell::Cell;
    use std::sync::atomic::{AtomicU32, Ordering};

    /// Golden-ratio increment; successive raw seeds are well spread even
    /// before mixing.
    const SEED_INCREMENT: u32 = 0x9e37_79b9;

    static SEEDER: AtomicU32 = AtomicU32::new(0);

    thread_local! {
        static PROBE: Cell<u32> = Cell::new(0);
    }

    #[inline]
    pub(crate) fn get() -> u32 {
        PROBE.with(Cell::get)
    }

    /// Seeds the calling thread's probe with a non-zero value.
    pub(crate) fn initialize() {
        let raw = SEEDER
            .fetch_add(SEED_INCREMENT, Ordering::Relaxed)
            .wrapping_add(SEED_INCREMENT);
        let mixed = mix32(raw);
        PROBE.with(|p| p.set(if mixed == 0 { 1 } else { mixed }));
    }

    /// Advances the probe by xorshift and stores it back.
    ///
    /// The constants (13, 17, 5) give a full-period sequence over the
    /// non-zero 32-bit states, so an initialized probe can never return
    /// to zero.
    #[inline]
    pub(crate) fn advance(mut p: u32) -> u32 {
        p ^= p << 13;
        p ^= p >> 17;
        p ^= p << 5;
        PROBE.with(|c| c.set(p));
        p
    }

    /// Final avalanche step of the 32-bit Murmur3 hash.
    fn mix32(mut z: u32) -> u32 {
        z = (z ^ (z >> 16)).wrapping_mul(0x85eb_ca6b);
        z = (z ^ (z >> 13)).wrapping_mul(0xc2b2_ae35);
        z ^ (z >> 16)
    }
}

/// A contention-adaptive 64-bit accumulator: `base` plus a lazily grown
/// table of padded cells.
///
/// This is the engine underneath every public flavor; the flavors decide
/// how the 64 bits are interpreted (`i64` directly, or an `f64` bit
/// pattern) and which combiner folds values together.
pub(crate) struct StripedWord {
    /// Cell table; null until the first base CAS failure.
    cells: AtomicPtr<CellTable>,
    /// Fast-path accumulator, also the fallback during table transitions.
    base: AtomicI64,
    /// Spin flag (0 or 1) guarding table init, growth and slot attach.
    cells_busy: AtomicU32,
    /// Growth bound: the table stops doubling once its length reaches
    /// this. Sampled once at construction.
    ncpu: usize,
}

// Raw table/cell pointers are only ever allocated by this type and freed
// in Drop; sharing &StripedWord across threads is the whole point.
unsafe impl Send for StripedWord {}
unsafe impl Sync for StripedWord {}

impl StripedWord {
    pub(crate) fn new() -> StripedWord {
        StripedWord::with_base(0)
    }

    /// A word whose empty state is `base` (accumulator identities are not
    /// always zero).
    pub(crate) fn with_base(base: i64) -> StripedWord {
        StripedWord::with_parallelism(base, ncpu())
    }

    fn with_parallelism(base: i64, ncpu: usize) -> StripedWord {
        StripedWord {
            cells: AtomicPtr::new(ptr::null_mut()),
            base: AtomicI64::new(base),
            cells_busy: AtomicU32::new(0),
            ncpu,
        }
    }

    #[inline]
    pub(crate) fn base(&self) -> i64 {
        self.base.load(Ordering::Acquire)
    }

    #[inline]
    pub(crate) fn cas_base(&self, cmp: i64, val: i64) -> bool {
        self.base
            .compare_exchange(cmp, val, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    #[inline]
    pub(crate) fn set_base(&self, val: i64) {
        self.base.store(val, Ordering::Release);
    }

    #[inline]
    pub(crate) fn take_base(&self, replacement: i64) -> i64 {
        self.base.swap(replacement, Ordering::AcqRel)
    }

    /// Whether the cell table has been allocated (i.e. contention has
    /// ever been observed).
    #[inline]
    pub(crate) fn is_striped(&self) -> bool {
        !self.cells.load(Ordering::Acquire).is_null()
    }

    /// Current table length; 0 while unstriped.
    pub(crate) fn cells_len(&self) -> usize {
        let tab = self.cells.load(Ordering::Acquire);
        if tab.is_null() {
            0
        } else {
            unsafe { (&(*tab).slots).len() }
        }
    }

    /// The calling thread's preferred cell, if the table exists and the
    /// slot is populated.
    ///
    /// Flavors try a single CAS on this cell before entering
    /// [`accumulate`](Self::accumulate); an uninitialized probe (zero)
    /// simply lands on slot 0.
    #[inline]
    pub(crate) fn probe_cell(&self) -> Option<&Cell> {
        let tab = self.cells.load(Ordering::Acquire);
        if tab.is_null() {
            return None;
        }
        // Tables are only freed in Drop, so a published pointer is valid
        // for as long as &self is.
        let slots = unsafe { &(*tab).slots };
        let slot = &slots[(slots.len() - 1) & probe::get() as usize];
        let cell = slot.load(Ordering::Acquire);
        if cell.is_null() {
            None
        } else {
            Some(unsafe { &*cell })
        }
    }

    /// Visits every populated cell of the current table snapshot.
    pub(crate) fn for_each_cell(&self, mut f: impl FnMut(usize, &Cell)) {
        let tab = self.cells.load(Ordering::Acquire);
        if tab.is_null() {
            return;
        }
        let slots = unsafe { &(*tab).slots };
        for (i, slot) in slots.iter().enumerate() {
            let cell = slot.load(Ordering::Acquire);
            if !cell.is_null() {
                f(i, unsafe { &*cell });
            }
        }
    }

    #[inline]
    fn try_lock_cells(&self) -> bool {
        self.cells_busy
            .compare_exchange(0, 1, Ordering::Acquire, Ordering::Relaxed)
            .is_ok()
    }

    #[inline]
    fn unlock_cells(&self) {
        self.cells_busy.store(0, Ordering::Release);
    }

    /// The slow-path retry loop: handles probe initialization, table
    /// initialization and growth, cell creation, and contention.
    ///
    /// `apply(current, x)` produces the replacement value for a CAS;
    /// it runs before the CAS is attempted and never under the spin
    /// flag, so a panicking combiner leaves no partial update and no
    /// held flag behind.
    ///
    /// `was_uncontended` is false iff the caller already lost a CAS on
    /// an existing cell; the first loss earns one free rehash before it
    /// counts toward growing the table.
    pub(crate) fn accumulate<F>(&self, x: i64, apply: F, mut was_uncontended: bool)
    where
        F: Fn(i64, i64) -> i64,
    {
        let mut h = probe::get();
        if h == 0 {
            probe::initialize();
            h = probe::get();
            // The fresh probe must be matched against a fresh view of
            // the table, and any failure the caller saw belonged to the
            // old (zero) probe.
            was_uncontended = true;
        }
        // True when the last pass hit a populated slot and lost its CAS;
        // growth requires two such passes in a row.
        let mut collide = false;
        loop {
            let tab = self.cells.load(Ordering::Acquire);
            if !tab.is_null() {
                let slots = unsafe { &(*tab).slots };
                let n = slots.len();
                let cell = slots[(n - 1) & h as usize].load(Ordering::Acquire);
                if cell.is_null() {
                    if self.cells_busy.load(Ordering::Relaxed) == 0 {
                        // Optimistically allocate before taking the flag.
                        let fresh = Box::into_raw(Box::new(Cell::new(x)));
                        if self.cells_busy.load(Ordering::Relaxed) == 0 && self.try_lock_cells() {
                            let mut created = false;
                            // Recheck under the flag: same table, slot
                            // still empty.
                            if self.cells.load(Ordering::Relaxed) == tab {
                                let slot = &slots[(n - 1) & h as usize];
                                if slot.load(Ordering::Relaxed).is_null() {
                                    slot.store(fresh, Ordering::Release);
                                    created = true;
                                }
                            }
                            self.unlock_cells();
                            if created {
                                // Creating the cell with x *was* the update.
                                return;
                            }
                            // Lost the race; the slot is now non-empty.
                            drop(unsafe { Box::from_raw(fresh) });
                            continue;
                        }
                        drop(unsafe { Box::from_raw(fresh) });
                    }
                    collide = false;
                } else if !was_uncontended {
                    // The caller's failed CAS may predate this thread's
                    // view of the table; grant one rehash before the
                    // failure counts.
                    was_uncontended = true;
                } else {
                    let cell = unsafe { &*cell };
                    let v = cell.load();
                    if cell.cas(v, apply(v, x)) {
                        return;
                    }
                    if n >= self.ncpu || self.cells.load(Ordering::Acquire) != tab {
                        // At max size, or someone else already grew.
                        collide = false;
                    } else if !collide {
                        collide = true;
                    } else if self.try_lock_cells() {
                        if self.cells.load(Ordering::Relaxed) == tab {
                            self.grow(tab);
                        }
                        self.unlock_cells();
                        collide = false;
                        // Retry with the expanded table.
                        continue;
                    }
                }
                h = probe::advance(h);
            } else if self.cells_busy.load(Ordering::Relaxed) == 0
                && self.cells.load(Ordering::Acquire).is_null()
                && self.try_lock_cells()
            {
                let mut init = false;
                if self.cells.load(Ordering::Relaxed).is_null() {
                    let table = CellTable::with_len(2);
                    table.slots[(h & 1) as usize]
                        .store(Box::into_raw(Box::new(Cell::new(x))), Ordering::Relaxed);
                    // Publishing the table also publishes the slot store
                    // above.
                    self.cells
                        .store(Box::into_raw(Box::new(table)), Ordering::Release);
                    init = true;
                }
                self.unlock_cells();
                if init {
                    return;
                }
            } else {
                // Table is being initialized or grown by someone else;
                // fall back on base rather than wait.
                let b = self.base();
                if self.cas_base(b, apply(b, x)) {
                    return;
                }
            }
        }
    }

    /// Doubles the table. Caller holds the spin flag and has verified
    /// the reference is still `old`.
    fn grow(&self, old: *mut CellTable) {
        let old_slots = unsafe { &(*old).slots };
        let mut table = Box::new(CellTable::with_len(old_slots.len() << 1));
        for (i, slot) in old_slots.iter().enumerate() {
            // Growth copies references; a slot never changes owners.
            table.slots[i].store(slot.load(Ordering::Relaxed), Ordering::Relaxed);
        }
        table.prev = old;
        self.cells.store(Box::into_raw(table), Ordering::Release);
    }
}

impl Drop for StripedWord {
    fn drop(&mut self) {
        let mut tab = *self.cells.get_mut();
        if tab.is_null() {
            return;
        }
        unsafe {
            // Older tables hold a subset of the newest table's cell
            // pointers (growth copies, slots are never reassigned), so
            // freeing cells through the newest table frees each exactly
            // once.
            for slot in (*tab).slots.iter() {
                let cell = slot.load(Ordering::Relaxed);
                if !cell.is_null() {
                    drop(Box::from_raw(cell));
                }
            }
            while !tab.is_null() {
                let boxed = Box::from_raw(tab);
                tab = boxed.prev;
            }
        }
    }
}
