#![crate_name = "seqomplexity"]
//! Per-base DNA sequence complexity.
//!
//! Every position of a sequence gets the product, over several kmer sizes,
//! of the fraction of distinct kmers in the window centered on it. Low
//! values flag repetitive, low-complexity stretches.
pub mod alphabet;
pub mod bitkmer;
pub mod complexity;
mod errors;
pub mod gc;
pub mod parser;
pub mod window;

pub use complexity::{
    score_sequence, BaseScorer, ComplexityParams, ComplexityScorer, Phase, ScoreRun,
};
pub use errors::{ComplexityError, ErrorPosition, ParseError, ParseErrorKind};
pub use gc::{score_gc, GcParams, GcScorer};
pub use parser::{parse_fasta_file, parse_fasta_reader, parse_fasta_stdin, FastaEvent};
pub use window::{FrequencyWindow, KmerWindow, LinearScanWindow};
