//! The errors seqomplexity can return: configuration/scoring errors and
//! FASTA parsing errors
use std::error::Error as StdError;
use std::fmt;
use std::io;

/// Represents where we were in a file when an error occurred.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ErrorPosition {
    /// Line number where the error occurred (starting with 1)
    pub line: u64,
    /// ID of record if available
    pub id: Option<String>,
}

impl fmt::Display for ErrorPosition {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if let Some(id) = self.id.as_ref() {
            write!(f, "record '{id}' at ")?;
        }
        write!(f, "line {}", self.line)
    }
}

/// The type of error that occured during file parsing
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ParseErrorKind {
    /// An error happened during file/stream input/output
    Io,
    /// Sequence data was found before the first `>` header
    InvalidStart,
    /// The input contained no bytes at all
    EmptyFile,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ParseError {
    /// A description of what went wrong
    pub msg: String,
    /// The type of error that occurred
    pub kind: ParseErrorKind,
    /// Position within file
    pub position: ErrorPosition,
}

impl ParseError {
    pub fn new_invalid_start(byte_found: u8, position: ErrorPosition) -> Self {
        let msg = format!(
            "Expected '>' but found '{}'",
            (byte_found as char).escape_default()
        );
        Self {
            kind: ParseErrorKind::InvalidStart,
            msg,
            position,
        }
    }

    pub fn new_empty_file() -> Self {
        Self {
            msg: String::from("Failed to read the first byte. Is the file empty?"),
            kind: ParseErrorKind::EmptyFile,
            position: ErrorPosition::default(),
        }
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.kind {
            ParseErrorKind::Io => write!(f, "I/O error: {}", self.msg),
            ParseErrorKind::InvalidStart | ParseErrorKind::EmptyFile => {
                write!(f, "{} ({})", self.msg, self.position)
            }
        }
    }
}

impl From<io::Error> for ParseError {
    fn from(err: io::Error) -> Self {
        Self {
            msg: err.to_string(),
            kind: ParseErrorKind::Io,
            position: ErrorPosition::default(),
        }
    }
}

impl StdError for ParseError {}

/// Everything that can go wrong while configuring or running a scorer.
///
/// All configuration variants are raised before a single base is read.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ComplexityError {
    /// The window must be odd so that it has a center base
    EvenWindow(usize),
    /// The window is outside of `min..=max`
    WindowOutOfRange { window: usize, min: usize, max: usize },
    /// No kmer length was configured
    NoKmers,
    /// Kmer lengths must be strictly ascending; `previous` was followed by `next`
    KmersNotAscending { previous: u8, next: u8 },
    /// A kmer length is zero or longer than the window
    KmerOutOfRange { k: u8, window: usize },
    /// The maximal number of distinct kmers for `k` is zero, which would
    /// divide by zero in the score
    DegenerateMaxDistinct { k: u8 },
    /// A sequence ended before a single full window was seen
    SequenceTooShort { len: usize, window: usize },
}

impl fmt::Display for ComplexityError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ComplexityError::EvenWindow(w) => {
                write!(f, "The window size must be an odd number, got {w}")
            }
            ComplexityError::WindowOutOfRange { window, min, max } => write!(
                f,
                "The window size must be between {min} and {max}, got {window}"
            ),
            ComplexityError::NoKmers => write!(f, "At least one kmer size is required"),
            ComplexityError::KmersNotAscending { previous, next } => write!(
                f,
                "Kmer sizes must be strictly ascending, but {previous} is followed by {next}"
            ),
            ComplexityError::KmerOutOfRange { k, window } => write!(
                f,
                "Kmer size {k} must be between 1 and the window size {window}"
            ),
            ComplexityError::DegenerateMaxDistinct { k } => {
                write!(f, "No kmer of size {k} fits in the window")
            }
            ComplexityError::SequenceTooShort { len, window } => write!(
                f,
                "Sequence of length {len} is shorter than the window size {window}"
            ),
        }
    }
}

impl StdError for ComplexityError {}
