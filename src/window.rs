//! Per-k window state: the codes of every kmer currently inside the window
//! and how many of them are distinct, maintained as the window slides.
use std::collections::BTreeSet;

use rustc_hash::FxHashMap;

use crate::bitkmer::{extend, KmerCode, RollingKmers};

/// Bookkeeping for the kmers of one length `k` inside a sliding window.
///
/// After `initialize` the window holds exactly `capacity()` codes, one per
/// kmer start position, and `distinct_count()` is always the cardinality of
/// the set of those codes.
pub trait KmerWindow {
    /// An empty window for kmers of size `k` in windows of `window` bases.
    ///
    /// # Panics
    ///
    /// Panics unless `1 <= k <= window`. [`ComplexityParams`] only admits
    /// sizes in that range.
    ///
    /// [`ComplexityParams`]: crate::complexity::ComplexityParams
    fn new(k: u8, window: usize) -> Self
    where
        Self: Sized;

    fn k(&self) -> u8;

    /// Number of kmers in a window: `window - k + 1`
    fn capacity(&self) -> usize;

    /// Loads the first full window of bases, overwriting any previous state.
    fn initialize(&mut self, bases: &[u8]);

    /// Slides the window one base to the right.
    fn advance(&mut self, new_rank: u8);

    fn distinct_count(&self) -> usize;

    /// The stored codes in slot order (slot order is circular, not positional).
    fn codes(&self) -> &[KmerCode];
}

/// Circular buffer of kmer codes shared by both window implementations.
#[derive(Debug, Clone)]
struct KmerRing {
    k: u8,
    capacity: usize,
    codes: Vec<KmerCode>,
    /// slot holding the oldest kmer, the next one to be replaced
    oldest: usize,
}

impl KmerRing {
    fn new(k: u8, window: usize) -> Self {
        assert!(k >= 1 && k as usize <= window);
        let capacity = window - k as usize + 1;
        KmerRing {
            k,
            capacity,
            codes: Vec::with_capacity(capacity),
            oldest: 0,
        }
    }

    fn fill(&mut self, bases: &[u8]) {
        assert_eq!(bases.len(), self.capacity + self.k as usize - 1);
        self.codes.clear();
        self.codes.extend(RollingKmers::new(bases, self.k));
        self.oldest = 0;
    }

    #[inline]
    fn newest(&self) -> usize {
        (self.oldest + self.capacity - 1) % self.capacity
    }

    /// Replaces the oldest code with the newest code extended by `new_rank`
    /// and returns `(outgoing, incoming)`.
    #[inline]
    fn roll(&mut self, new_rank: u8) -> (KmerCode, KmerCode) {
        let slot = self.oldest;
        let outgoing = self.codes[slot];
        let incoming = extend(self.codes[self.newest()], new_rank, self.k);
        self.codes[slot] = incoming;
        self.oldest = (slot + 1) % self.capacity;
        (outgoing, incoming)
    }

    #[inline]
    fn occurrences(&self, code: KmerCode) -> usize {
        self.codes.iter().filter(|&&c| c == code).count()
    }
}

/// Reference window that rescans the whole buffer on every step, O(window)
/// per base.
#[derive(Debug, Clone)]
pub struct LinearScanWindow {
    ring: KmerRing,
    distinct: usize,
}

impl KmerWindow for LinearScanWindow {
    fn new(k: u8, window: usize) -> Self {
        LinearScanWindow {
            ring: KmerRing::new(k, window),
            distinct: 0,
        }
    }

    fn k(&self) -> u8 {
        self.ring.k
    }

    fn capacity(&self) -> usize {
        self.ring.capacity
    }

    fn initialize(&mut self, bases: &[u8]) {
        self.ring.fill(bases);
        self.distinct = self.ring.codes.iter().collect::<BTreeSet<_>>().len();
    }

    fn advance(&mut self, new_rank: u8) {
        // the outgoing code is judged against the buffer before the write,
        // the incoming one against the buffer after it
        let outgoing = self.ring.codes[self.ring.oldest];
        if self.ring.occurrences(outgoing) == 1 {
            self.distinct -= 1;
        }
        let (_, incoming) = self.ring.roll(new_rank);
        if self.ring.occurrences(incoming) == 1 {
            self.distinct += 1;
        }
    }

    fn distinct_count(&self) -> usize {
        self.distinct
    }

    fn codes(&self) -> &[KmerCode] {
        &self.ring.codes
    }
}

/// Window keeping an occurrence count per code, O(1) amortized per base.
#[derive(Debug, Clone)]
pub struct FrequencyWindow {
    ring: KmerRing,
    counts: FxHashMap<KmerCode, u32>,
}

impl FrequencyWindow {
    #[inline]
    fn insert(&mut self, code: KmerCode) {
        *self.counts.entry(code).or_insert(0) += 1;
    }

    #[inline]
    fn remove(&mut self, code: KmerCode) {
        if let Some(count) = self.counts.get_mut(&code) {
            *count -= 1;
            if *count == 0 {
                self.counts.remove(&code);
            }
        }
    }
}

impl KmerWindow for FrequencyWindow {
    fn new(k: u8, window: usize) -> Self {
        let ring = KmerRing::new(k, window);
        let counts = FxHashMap::with_capacity_and_hasher(ring.capacity, Default::default());
        FrequencyWindow { ring, counts }
    }

    fn k(&self) -> u8 {
        self.ring.k
    }

    fn capacity(&self) -> usize {
        self.ring.capacity
    }

    fn initialize(&mut self, bases: &[u8]) {
        self.ring.fill(bases);
        self.counts.clear();
        for i in 0..self.ring.codes.len() {
            let code = self.ring.codes[i];
            self.insert(code);
        }
    }

    fn advance(&mut self, new_rank: u8) {
        let (outgoing, incoming) = self.ring.roll(new_rank);
        self.remove(outgoing);
        self.insert(incoming);
    }

    fn distinct_count(&self) -> usize {
        self.counts.len()
    }

    fn codes(&self) -> &[KmerCode] {
        &self.ring.codes
    }
}
