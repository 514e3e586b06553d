//! Per-base sequence complexity: for every position, the product over the
//! configured kmer sizes of how many distinct kmers the window centered on
//! it contains, relative to the most it could contain.
//!
//! Scores are produced in a streaming fashion. The first full window is
//! scored once and that score stands in for every position up to and
//! including the window center; the last window's score likewise covers the
//! trailing half window. This keeps exactly one score per input base.
use std::iter::{repeat, Repeat, Take};

use log::{log_enabled, trace, Level};

use crate::alphabet::{rank, MAX_K, NUCLEOTIDES};
use crate::bitkmer::code_to_bytes;
use crate::errors::ComplexityError;
use crate::window::{FrequencyWindow, KmerWindow};

pub const MIN_WINDOW: usize = 3;
pub const MAX_WINDOW: usize = MAX_K;
pub const DEFAULT_WINDOW: usize = 21;
pub const DEFAULT_KMERS: [u8; 9] = [2, 3, 4, 5, 6, 7, 8, 9, 10];

/// Most distinct kmers of size `k` a window can hold: limited by either the
/// number of kmer positions or the number of possible nucleotide kmers.
pub fn max_distinct(window: usize, k: u8) -> usize {
    let positions = (window + 1).saturating_sub(k as usize);
    positions.min(NUCLEOTIDES.saturating_pow(u32::from(k)))
}

/// A validated window size and set of kmer sizes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComplexityParams {
    window: usize,
    kmers: Vec<u8>,
    max_distinct: Vec<usize>,
}

impl ComplexityParams {
    pub fn new(window: usize, kmers: &[u8]) -> Result<Self, ComplexityError> {
        if !(MIN_WINDOW..=MAX_WINDOW).contains(&window) {
            return Err(ComplexityError::WindowOutOfRange {
                window,
                min: MIN_WINDOW,
                max: MAX_WINDOW,
            });
        }
        if window % 2 == 0 {
            return Err(ComplexityError::EvenWindow(window));
        }
        if kmers.is_empty() {
            return Err(ComplexityError::NoKmers);
        }
        for pair in kmers.windows(2) {
            if pair[0] >= pair[1] {
                return Err(ComplexityError::KmersNotAscending {
                    previous: pair[0],
                    next: pair[1],
                });
            }
        }

        let mut max = Vec::with_capacity(kmers.len());
        for &k in kmers {
            if k == 0 || k as usize > window {
                return Err(ComplexityError::KmerOutOfRange { k, window });
            }
            let m = max_distinct(window, k);
            if m == 0 {
                return Err(ComplexityError::DegenerateMaxDistinct { k });
            }
            max.push(m);
        }

        Ok(ComplexityParams {
            window,
            kmers: kmers.to_vec(),
            max_distinct: max,
        })
    }

    pub fn window(&self) -> usize {
        self.window
    }

    pub fn kmers(&self) -> &[u8] {
        &self.kmers
    }

    /// Bases on each side of the window center.
    pub fn flank(&self) -> usize {
        self.window / 2
    }

    /// Whether every kmer fits in half a window, the range the scores were
    /// designed for. Other sizes are valid but saturate quickly.
    pub fn is_canonical(&self) -> bool {
        self.kmers.iter().all(|&k| k >= 2 && k as usize <= self.flank())
    }
}

impl Default for ComplexityParams {
    fn default() -> Self {
        let kmers = DEFAULT_KMERS.to_vec();
        let max = kmers
            .iter()
            .map(|&k| max_distinct(DEFAULT_WINDOW, k))
            .collect();
        ComplexityParams {
            window: DEFAULT_WINDOW,
            kmers,
            max_distinct: max,
        }
    }
}

/// `count` consecutive positions sharing one score.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoreRun {
    pub score: f32,
    pub count: usize,
}

impl IntoIterator for ScoreRun {
    type Item = f32;
    type IntoIter = Take<Repeat<f32>>;

    fn into_iter(self) -> Self::IntoIter {
        repeat(self.score).take(self.count)
    }
}

/// A streaming per-base scorer: bases in, runs of final scores out.
pub trait BaseScorer {
    /// Consume one base, returning the scores it made final.
    fn push(&mut self, base: u8) -> Option<ScoreRun>;

    /// End the sequence, returning the scores of the trailing flank.
    fn finish(&mut self) -> Result<ScoreRun, ComplexityError>;

    /// Start over with an empty sequence.
    fn reset(&mut self);
}

/// Where a scorer is in its current sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Nothing seen yet
    Empty,
    /// Collecting the first full window
    Filling,
    /// One score per base
    Steady,
    /// `finish` was called; trailing scores were handed out
    Draining,
}

#[derive(Debug, Clone)]
struct KmerTrack<T> {
    window: T,
    max_distinct: usize,
}

/// Streaming complexity scorer for one sequence at a time.
///
/// Feed bases with [`push`](ComplexityScorer::push) and close the sequence
/// with [`finish`](ComplexityScorer::finish). Pushing after `finish` starts
/// a new sequence.
///
/// ```
/// use seqomplexity::{ComplexityParams, ComplexityScorer};
///
/// let params = ComplexityParams::new(3, &[2]).unwrap();
/// let mut scorer: ComplexityScorer = ComplexityScorer::new(params);
/// let mut scores = Vec::new();
/// for &b in b"AAAAAAA" {
///     scores.extend(scorer.push(b).into_iter().flatten());
/// }
/// scores.extend(scorer.finish().unwrap());
/// assert_eq!(scores, vec![0.5; 7]);
/// ```
#[derive(Debug, Clone)]
pub struct ComplexityScorer<T: KmerWindow = FrequencyWindow> {
    params: ComplexityParams,
    tracks: Vec<KmerTrack<T>>,
    first_window: Vec<u8>,
    phase: Phase,
    consumed: usize,
    score: f32,
}

impl<T: KmerWindow> ComplexityScorer<T> {
    pub fn new(params: ComplexityParams) -> Self {
        let tracks = params
            .kmers
            .iter()
            .zip(params.max_distinct.iter())
            .map(|(&k, &max_distinct)| KmerTrack {
                window: T::new(k, params.window),
                max_distinct,
            })
            .collect();
        ComplexityScorer {
            first_window: Vec::with_capacity(params.window),
            params,
            tracks,
            phase: Phase::Empty,
            consumed: 0,
            score: 0.0,
        }
    }

    pub fn params(&self) -> &ComplexityParams {
        &self.params
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Bases pushed since the sequence started.
    pub fn consumed(&self) -> usize {
        self.consumed
    }

    /// Forget the current sequence. Window buffers are kept and overwritten
    /// by the next initialization.
    pub fn reset(&mut self) {
        self.first_window.clear();
        self.phase = Phase::Empty;
        self.consumed = 0;
        self.score = 0.0;
    }

    /// Score of the current window; only meaningful once `Steady`.
    pub fn score(&self) -> f32 {
        self.score
    }

    /// `(k, distinct kmers of size k)` for the current window.
    pub fn distinct_counts(&self) -> impl Iterator<Item = (u8, usize)> + '_ {
        self.tracks
            .iter()
            .map(|t| (t.window.k(), t.window.distinct_count()))
    }

    fn compute_score(&self) -> f32 {
        self.tracks.iter().fold(1.0, |acc, t| {
            // ambiguous bases can push a window past the nucleotide vocabulary
            let distinct = t.window.distinct_count().min(t.max_distinct);
            acc * (distinct as f32 / t.max_distinct as f32)
        })
    }

    /// Consume one base. Returns the scores that became final: the whole
    /// left flank on the base completing the first window, then one score
    /// per base.
    pub fn push(&mut self, base: u8) -> Option<ScoreRun> {
        match self.phase {
            Phase::Empty | Phase::Filling => self.fill(base),
            Phase::Steady => Some(self.slide(base)),
            Phase::Draining => {
                self.reset();
                self.fill(base)
            }
        }
    }

    fn fill(&mut self, base: u8) -> Option<ScoreRun> {
        self.consumed += 1;
        self.first_window.push(base);
        if self.first_window.len() < self.params.window {
            self.phase = Phase::Filling;
            return None;
        }
        for track in self.tracks.iter_mut() {
            track.window.initialize(&self.first_window);
        }
        self.phase = Phase::Steady;
        self.score = self.compute_score();
        trace!(
            "first window {:?} scored {}",
            String::from_utf8_lossy(&self.first_window),
            self.score
        );
        if log_enabled!(Level::Trace) {
            for track in &self.tracks {
                let k = track.window.k();
                let kmers: Vec<String> = track
                    .window
                    .codes()
                    .iter()
                    .map(|&code| String::from_utf8_lossy(&code_to_bytes(code, k)).into_owned())
                    .collect();
                trace!("k={}: {} distinct in {:?}", k, track.window.distinct_count(), kmers);
            }
        }
        Some(ScoreRun {
            score: self.score,
            count: self.params.flank() + 1,
        })
    }

    fn slide(&mut self, base: u8) -> ScoreRun {
        self.consumed += 1;
        let r = rank(base);
        for track in self.tracks.iter_mut() {
            track.window.advance(r);
        }
        self.score = self.compute_score();
        ScoreRun {
            score: self.score,
            count: 1,
        }
    }

    /// Push every base of `bases`, appending the scores to `out`.
    pub fn push_all<E: Extend<f32>>(&mut self, bases: &[u8], out: &mut E) {
        for &b in bases {
            if let Some(run) = self.push(b) {
                out.extend(run);
            }
        }
    }

    /// End the current sequence and return the scores of its right flank.
    ///
    /// A sequence shorter than the window never gets a score: the result is
    /// [`ComplexityError::SequenceTooShort`] and nothing was emitted for its
    /// bases, so the one-score-per-base guarantee only covers sequences of
    /// at least `window` bases.
    pub fn finish(&mut self) -> Result<ScoreRun, ComplexityError> {
        let steady = self.phase == Phase::Steady;
        self.phase = Phase::Draining;
        if !steady {
            return Err(ComplexityError::SequenceTooShort {
                len: self.consumed,
                window: self.params.window,
            });
        }
        trace!("sequence of {} bases finished", self.consumed);
        Ok(ScoreRun {
            score: self.score,
            count: self.params.flank(),
        })
    }
}

impl<T: KmerWindow> BaseScorer for ComplexityScorer<T> {
    fn push(&mut self, base: u8) -> Option<ScoreRun> {
        ComplexityScorer::push(self, base)
    }

    fn finish(&mut self) -> Result<ScoreRun, ComplexityError> {
        ComplexityScorer::finish(self)
    }

    fn reset(&mut self) {
        ComplexityScorer::reset(self)
    }
}

/// Scores a whole in-memory sequence, one score per base.
pub fn score_sequence(params: &ComplexityParams, seq: &[u8]) -> Result<Vec<f32>, ComplexityError> {
    let mut scorer: ComplexityScorer = ComplexityScorer::new(params.clone());
    let mut scores = Vec::with_capacity(seq.len());
    scorer.push_all(seq, &mut scores);
    scores.extend(scorer.finish()?);
    Ok(scores)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bitkmer::hash_of;
    use crate::window::LinearScanWindow;
    use proptest::prelude::*;
    use std::collections::HashSet;

    /// Scores one window without any incremental state.
    fn window_score(window: &[u8], kmers: &[u8]) -> f32 {
        kmers.iter().fold(1.0, |acc, &k| {
            let distinct: HashSet<_> = window.windows(k as usize).map(hash_of).collect();
            let max = max_distinct(window.len(), k);
            acc * (distinct.len().min(max) as f32 / max as f32)
        })
    }

    /// Same padding rules as the scorer, recomputing every window from scratch.
    fn naive_scores(seq: &[u8], w: usize, kmers: &[u8]) -> Vec<f32> {
        let per_window: Vec<f32> = seq.windows(w).map(|win| window_score(win, kmers)).collect();
        let mut scores = vec![per_window[0]; w / 2];
        scores.extend(&per_window);
        scores.extend(vec![per_window[per_window.len() - 1]; w / 2]);
        scores
    }

    fn acgt_sequence(min: usize) -> impl Strategy<Value = Vec<u8>> {
        prop::collection::vec(prop::sample::select(b"ACGT".to_vec()), min..300)
    }

    #[test]
    fn test_max_distinct() {
        assert_eq!(max_distinct(5, 2), 4);
        assert_eq!(max_distinct(21, 2), 16);
        assert_eq!(max_distinct(21, 1), 4);
        assert_eq!(max_distinct(21, 10), 12);
        assert_eq!(max_distinct(21, 21), 1);
        assert_eq!(max_distinct(3, 4), 0);
    }

    #[test]
    fn test_params_validation() {
        assert!(ComplexityParams::new(5, &[2]).is_ok());
        assert!(ComplexityParams::new(3, &[1, 2, 3]).is_ok());
        assert_eq!(
            ComplexityParams::new(6, &[2]),
            Err(ComplexityError::EvenWindow(6))
        );
        assert_eq!(
            ComplexityParams::new(23, &[2]),
            Err(ComplexityError::WindowOutOfRange {
                window: 23,
                min: MIN_WINDOW,
                max: MAX_WINDOW
            })
        );
        assert!(matches!(
            ComplexityParams::new(1, &[1]),
            Err(ComplexityError::WindowOutOfRange { .. })
        ));
        assert_eq!(ComplexityParams::new(5, &[]), Err(ComplexityError::NoKmers));
        assert_eq!(
            ComplexityParams::new(9, &[2, 4, 3]),
            Err(ComplexityError::KmersNotAscending {
                previous: 4,
                next: 3
            })
        );
        assert_eq!(
            ComplexityParams::new(9, &[2, 2]),
            Err(ComplexityError::KmersNotAscending {
                previous: 2,
                next: 2
            })
        );
        assert_eq!(
            ComplexityParams::new(5, &[2, 6]),
            Err(ComplexityError::KmerOutOfRange { k: 6, window: 5 })
        );
        assert_eq!(
            ComplexityParams::new(5, &[0, 2]),
            Err(ComplexityError::KmerOutOfRange { k: 0, window: 5 })
        );
    }

    #[test]
    fn default_params_are_canonical() {
        let params = ComplexityParams::default();
        assert_eq!(
            params,
            ComplexityParams::new(DEFAULT_WINDOW, &DEFAULT_KMERS).unwrap()
        );
        assert!(params.is_canonical());
        assert!(!ComplexityParams::new(5, &[2, 3]).unwrap().is_canonical());
    }

    #[test]
    fn periodic_sequence_is_maximally_complex() {
        let params = ComplexityParams::new(5, &[2]).unwrap();
        let seq = b"ACGTACGTAC";
        let scores = score_sequence(&params, seq).unwrap();
        assert_eq!(scores, vec![1.0; 10]);
        assert_eq!(scores, naive_scores(seq, 5, &[2]));
    }

    #[test]
    fn homopolymer_scores_half() {
        let params = ComplexityParams::new(3, &[2]).unwrap();
        let mut scorer: ComplexityScorer = ComplexityScorer::new(params);
        let mut scores = Vec::new();
        for &b in b"AAAAAAA" {
            scores.extend(scorer.push(b).into_iter().flatten());
            if scorer.phase() == Phase::Steady {
                assert_eq!(scorer.distinct_counts().collect::<Vec<_>>(), vec![(2, 1)]);
            }
        }
        scores.extend(scorer.finish().unwrap());
        assert_eq!(scores, vec![0.5; 7]);
    }

    #[test]
    fn phases_and_padding() {
        let params = ComplexityParams::new(5, &[1, 2]).unwrap();
        let mut scorer: ComplexityScorer = ComplexityScorer::new(params);
        assert_eq!(scorer.phase(), Phase::Empty);
        for &b in b"ACGT" {
            assert_eq!(scorer.push(b), None);
            assert_eq!(scorer.phase(), Phase::Filling);
        }
        let first = scorer.push(b'T').unwrap();
        assert_eq!(first.count, 3);
        assert_eq!(scorer.phase(), Phase::Steady);
        // ACGTT: 4 of 4 bases, 4 of 4 2-mers
        assert_eq!(first.score, 1.0);

        let next = scorer.push(b'T').unwrap();
        // CGTTT: 3 of 4 bases, 3 of 4 2-mers
        assert_eq!(next, ScoreRun { score: 0.5625, count: 1 });

        let last = scorer.finish().unwrap();
        assert_eq!(last, ScoreRun { score: 0.5625, count: 2 });
        assert_eq!(scorer.phase(), Phase::Draining);
        assert_eq!(scorer.consumed(), 6);
    }

    #[test]
    fn short_sequences_are_rejected() {
        let params = ComplexityParams::new(7, &[2]).unwrap();
        assert_eq!(
            score_sequence(&params, b"ACGTAC"),
            Err(ComplexityError::SequenceTooShort { len: 6, window: 7 })
        );
        assert_eq!(
            score_sequence(&params, b""),
            Err(ComplexityError::SequenceTooShort { len: 0, window: 7 })
        );
        assert_eq!(score_sequence(&params, b"ACGTACG").unwrap().len(), 7);
    }

    #[test]
    fn scorer_is_reusable() {
        let params = ComplexityParams::new(5, &[2, 3]).unwrap();
        let mut scorer: ComplexityScorer = ComplexityScorer::new(params.clone());
        let mut first = Vec::new();
        scorer.push_all(b"ACGTTTTTGCA", &mut first);
        first.extend(scorer.finish().unwrap());

        let mut other = Vec::new();
        scorer.push_all(b"GGGGGGG", &mut other);
        other.extend(scorer.finish().unwrap());

        let mut second = Vec::new();
        scorer.reset();
        scorer.push_all(b"ACGTTTTTGCA", &mut second);
        second.extend(scorer.finish().unwrap());

        assert_eq!(first, second);
        assert_eq!(first, score_sequence(&params, b"ACGTTTTTGCA").unwrap());
        assert_eq!(other, score_sequence(&params, b"GGGGGGG").unwrap());
    }

    #[test]
    fn push_after_finish_starts_a_new_sequence() {
        let params = ComplexityParams::new(3, &[2]).unwrap();
        let mut scorer: ComplexityScorer = ComplexityScorer::new(params);
        scorer.push_all(b"ACGT", &mut Vec::new());
        assert!(scorer.finish().is_ok());
        assert_eq!(scorer.phase(), Phase::Draining);

        assert_eq!(scorer.push(b'A'), None);
        assert_eq!(scorer.phase(), Phase::Filling);
        assert_eq!(scorer.consumed(), 1);

        // a failed finish drains too
        assert!(scorer.finish().is_err());
        assert_eq!(scorer.phase(), Phase::Draining);
        let mut scores = Vec::new();
        scorer.push_all(b"AAA", &mut scores);
        assert_eq!(scores, vec![0.5; 2]);
        assert_eq!(scorer.consumed(), 3);
    }

    #[test]
    fn uracil_and_lowercase() {
        let params = ComplexityParams::new(3, &[1]).unwrap();
        // U is not folded onto T: it is a fifth, ambiguous symbol
        assert_eq!(score_sequence(&params, b"ATU").unwrap(), vec![1.0; 3]);
        assert_eq!(score_sequence(&params, b"UUU").unwrap(), vec![1.0 / 3.0; 3]);
        assert_eq!(
            score_sequence(&params, b"acgtac").unwrap(),
            score_sequence(&params, b"ACGTAC").unwrap()
        );
    }

    #[test]
    fn ambiguous_bases_are_scored() {
        let params = ComplexityParams::new(5, &[1]).unwrap();
        // ACGTN has five distinct ranks but only four nucleotides are counted
        let scores = score_sequence(&params, b"ACGTN").unwrap();
        assert_eq!(scores, vec![1.0; 5]);
        let scores = score_sequence(&params, b"NNNNNNN").unwrap();
        assert_eq!(scores, vec![0.25; 7]);
    }

    proptest! {
        #[test]
        fn matches_naive_scores(
            half in 1usize..=10,
            first_k in 1u8..=3,
            step in 1u8..=3,
            seq in acgt_sequence(21)
        ) {
            let w = 2 * half + 1;
            let kmers: Vec<u8> = (0..3)
                .map(|i| first_k + i * step)
                .filter(|&k| k as usize <= w)
                .collect();
            let params = ComplexityParams::new(w, &kmers).unwrap();
            let scores = score_sequence(&params, &seq).unwrap();
            prop_assert_eq!(scores.len(), seq.len());
            prop_assert_eq!(scores, naive_scores(&seq, w, &kmers));
        }

        #[test]
        fn linear_and_frequency_scorers_agree(
            seq in prop::collection::vec(prop::sample::select(b"ACGTN".to_vec()), 9..200)
        ) {
            let params = ComplexityParams::new(9, &[2, 3, 4]).unwrap();
            let mut fast: ComplexityScorer<FrequencyWindow> = ComplexityScorer::new(params.clone());
            let mut slow: ComplexityScorer<LinearScanWindow> = ComplexityScorer::new(params);
            for &b in &seq {
                prop_assert_eq!(fast.push(b), slow.push(b));
                prop_assert!(fast.distinct_counts().eq(slow.distinct_counts()));
            }
            prop_assert_eq!(fast.finish(), slow.finish());
        }

        #[test]
        fn scores_are_bounded(seq in acgt_sequence(21)) {
            let params = ComplexityParams::default();
            let mut scorer: ComplexityScorer = ComplexityScorer::new(params.clone());
            let mut scores = Vec::new();
            for &b in &seq {
                if let Some(run) = scorer.push(b) {
                    scores.extend(run);
                }
                if scorer.phase() == Phase::Steady {
                    for ((k, distinct), &k_cfg) in scorer.distinct_counts().zip(params.kmers()) {
                        prop_assert_eq!(k, k_cfg);
                        prop_assert!(distinct >= 1);
                        prop_assert!(distinct <= max_distinct(params.window(), k));
                    }
                }
            }
            scores.extend(scorer.finish().unwrap());
            prop_assert_eq!(scores.len(), seq.len());
            prop_assert!(scores.iter().all(|&s| s > 0.0 && s <= 1.0));

            let again = score_sequence(&params, &seq).unwrap();
            prop_assert!(scores.iter().zip(&again).all(|(a, b)| a.to_bits() == b.to_bits()));
        }
    }
}
