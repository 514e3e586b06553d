//! Sliding-window GC content with the same padding rules as the complexity
//! scorer. The window is a shift register with one bit per base (set for G
//! or C), so its GC count is a popcount.
use log::trace;

use crate::alphabet::is_gc;
use crate::complexity::{BaseScorer, Phase, ScoreRun};
use crate::errors::ComplexityError;

pub const MAX_GC_WINDOW: usize = u64::BITS as usize - 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GcParams {
    window: usize,
}

impl GcParams {
    pub fn new(window: usize) -> Result<Self, ComplexityError> {
        if !(1..=MAX_GC_WINDOW).contains(&window) {
            return Err(ComplexityError::WindowOutOfRange {
                window,
                min: 1,
                max: MAX_GC_WINDOW,
            });
        }
        if window % 2 == 0 {
            return Err(ComplexityError::EvenWindow(window));
        }
        Ok(GcParams { window })
    }

    pub fn window(&self) -> usize {
        self.window
    }

    pub fn flank(&self) -> usize {
        self.window / 2
    }
}

#[derive(Debug, Clone)]
pub struct GcScorer {
    params: GcParams,
    mask: u64,
    bits: u64,
    phase: Phase,
    consumed: usize,
}

impl GcScorer {
    pub fn new(params: GcParams) -> Self {
        GcScorer {
            mask: (1 << params.window) - 1,
            params,
            bits: 0,
            phase: Phase::Empty,
            consumed: 0,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn reset(&mut self) {
        self.bits = 0;
        self.phase = Phase::Empty;
        self.consumed = 0;
    }

    /// Fraction of G/C bases in the current window.
    pub fn score(&self) -> f32 {
        self.bits.count_ones() as f32 / self.params.window as f32
    }

    pub fn push(&mut self, base: u8) -> Option<ScoreRun> {
        if self.phase == Phase::Draining {
            self.reset();
        }
        self.consumed += 1;
        self.bits = ((self.bits << 1) | u64::from(is_gc(base))) & self.mask;

        if self.consumed < self.params.window {
            self.phase = Phase::Filling;
            None
        } else if self.consumed == self.params.window {
            self.phase = Phase::Steady;
            trace!("first GC window scored {}", self.score());
            Some(ScoreRun {
                score: self.score(),
                count: self.params.flank() + 1,
            })
        } else {
            Some(ScoreRun {
                score: self.score(),
                count: 1,
            })
        }
    }

    pub fn push_all<E: Extend<f32>>(&mut self, bases: &[u8], out: &mut E) {
        for &b in bases {
            if let Some(run) = self.push(b) {
                out.extend(run);
            }
        }
    }

    /// Scores of the right flank, or `SequenceTooShort` (and no scores at
    /// all) for a sequence shorter than the window.
    pub fn finish(&mut self) -> Result<ScoreRun, ComplexityError> {
        let steady = self.phase == Phase::Steady;
        self.phase = Phase::Draining;
        if !steady {
            return Err(ComplexityError::SequenceTooShort {
                len: self.consumed,
                window: self.params.window,
            });
        }
        Ok(ScoreRun {
            score: self.score(),
            count: self.params.flank(),
        })
    }
}

impl BaseScorer for GcScorer {
    fn push(&mut self, base: u8) -> Option<ScoreRun> {
        GcScorer::push(self, base)
    }

    fn finish(&mut self) -> Result<ScoreRun, ComplexityError> {
        GcScorer::finish(self)
    }

    fn reset(&mut self) {
        GcScorer::reset(self)
    }
}

/// GC content of a whole in-memory sequence, one score per base.
pub fn score_gc(params: GcParams, seq: &[u8]) -> Result<Vec<f32>, ComplexityError> {
    let mut scorer = GcScorer::new(params);
    let mut scores = Vec::with_capacity(seq.len());
    scorer.push_all(seq, &mut scores);
    scores.extend(scorer.finish()?);
    Ok(scores)
}
