//! A streaming FASTA reader. Sequence lines are handed out in chunks
//! straight from the read buffer, so records of any length are scored
//! without ever being held in memory.
use std::io::{self, BufRead};

use memchr::memchr;

use crate::errors::{ErrorPosition, ParseError};

pub(crate) const BUFSIZE: usize = 64 * 1024;

/// Remove a final '\r' from a byte slice
#[inline]
pub(crate) fn trim_cr(line: &[u8]) -> &[u8] {
    if let Some((&b'\r', remaining)) = line.split_last() {
        remaining
    } else {
        line
    }
}

/// What the reader found next in the stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FastaEvent<'a> {
    /// A header line, without the leading `>` and the line terminator.
    Header(&'a [u8]),
    /// Some bases of the current record, never containing line terminators.
    /// A single sequence line may arrive in several chunks.
    Bases(&'a [u8]),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LineState {
    LineStart,
    Header,
    Sequence,
}

pub struct Reader<R: io::Read> {
    buf_reader: buffer_redux::BufReader<R>,
    header: Vec<u8>,
    /// bytes of the last returned chunk, consumed on the next call
    pending: usize,
    state: LineState,
    line: u64,
    seen_header: bool,
    finished: bool,
}

impl<R> Reader<R>
where
    R: io::Read,
{
    /// Creates a new reader with the default buffer size of 64 KiB
    ///
    /// # Example:
    ///
    /// ```
    /// use seqomplexity::parser::{FastaEvent, FastaReader};
    /// let fasta = b">id\nACGT";
    ///
    /// let mut reader = FastaReader::new(&fasta[..]);
    /// assert_eq!(reader.next().unwrap().unwrap(), FastaEvent::Header(b"id"));
    /// assert_eq!(reader.next().unwrap().unwrap(), FastaEvent::Bases(b"ACGT"));
    /// assert!(reader.next().is_none());
    /// ```
    #[inline]
    pub fn new(reader: R) -> Reader<R> {
        Reader::with_capacity(reader, BUFSIZE)
    }

    /// Creates a new reader with a given buffer capacity. The minimum allowed
    /// capacity is 2.
    #[inline]
    pub fn with_capacity(reader: R, capacity: usize) -> Reader<R> {
        assert!(capacity >= 2);
        Reader {
            buf_reader: buffer_redux::BufReader::with_capacity(capacity, reader),
            header: Vec::new(),
            pending: 0,
            state: LineState::LineStart,
            line: 0,
            seen_header: false,
            finished: false,
        }
    }

    /// Line number of the line being read (starting with 1)
    pub fn line(&self) -> u64 {
        self.line
    }

    #[inline]
    fn consume(&mut self, amt: usize) {
        self.buf_reader.consume(amt);
    }

    /// Gets the next event in the stream, `None` once the input is exhausted.
    /// This imitates the Iterator API but the returned slices borrow the
    /// reader's buffer.
    pub fn next(&mut self) -> Option<Result<FastaEvent<'_>, ParseError>> {
        if self.finished {
            return None;
        }
        let pending = std::mem::take(&mut self.pending);
        self.consume(pending);

        loop {
            if self.buf_reader.buffer().is_empty() {
                self.buf_reader.make_room();
                let read = match self.buf_reader.fill_buf() {
                    Ok(buf) => buf.len(),
                    Err(ref e) if e.kind() == io::ErrorKind::Interrupted => continue,
                    Err(e) => {
                        self.finished = true;
                        return Some(Err(e.into()));
                    }
                };
                if read == 0 {
                    self.finished = true;
                    if self.line == 0 {
                        return Some(Err(ParseError::new_empty_file()));
                    }
                    if self.state == LineState::Header {
                        self.state = LineState::LineStart;
                        return Some(Ok(FastaEvent::Header(trim_cr(&self.header))));
                    }
                    return None;
                }
                continue;
            }

            match self.state {
                LineState::LineStart => {
                    let first = self.buf_reader.buffer()[0];
                    if first != b'\r' {
                        self.line += 1;
                    }
                    match first {
                        b'>' => {
                            self.consume(1);
                            self.header.clear();
                            self.seen_header = true;
                            self.state = LineState::Header;
                        }
                        b'\n' | b'\r' => self.consume(1),
                        _ if !self.seen_header => {
                            self.finished = true;
                            let position = ErrorPosition {
                                line: self.line,
                                id: None,
                            };
                            return Some(Err(ParseError::new_invalid_start(first, position)));
                        }
                        _ => self.state = LineState::Sequence,
                    }
                }
                LineState::Header => {
                    let buf = self.buf_reader.buffer();
                    match memchr(b'\n', buf) {
                        Some(pos) => {
                            self.header.extend_from_slice(&buf[..pos]);
                            self.consume(pos + 1);
                            self.state = LineState::LineStart;
                            return Some(Ok(FastaEvent::Header(trim_cr(&self.header))));
                        }
                        None => {
                            let len = buf.len();
                            self.header.extend_from_slice(buf);
                            self.consume(len);
                        }
                    }
                }
                LineState::Sequence => {
                    let buf = self.buf_reader.buffer();
                    let (chunk_len, used) = match memchr(b'\n', buf) {
                        Some(pos) => {
                            self.state = LineState::LineStart;
                            (trim_cr(&buf[..pos]).len(), pos + 1)
                        }
                        // a trailing '\r' may be the first half of a "\r\n" cut by the buffer
                        None if buf.last() == Some(&b'\r') => (buf.len() - 1, buf.len() - 1),
                        None => (buf.len(), buf.len()),
                    };
                    if used == 0 {
                        // only the held back '\r' is buffered
                        self.buf_reader.make_room();
                        match self.buf_reader.read_into_buf() {
                            Ok(0) => self.consume(1),
                            Ok(_) => {}
                            Err(ref e) if e.kind() == io::ErrorKind::Interrupted => {}
                            Err(e) => {
                                self.finished = true;
                                return Some(Err(e.into()));
                            }
                        }
                        continue;
                    }
                    if chunk_len == 0 {
                        self.consume(used);
                        continue;
                    }
                    self.pending = used;
                    return Some(Ok(FastaEvent::Bases(
                        &self.buf_reader.buffer()[..chunk_len],
                    )));
                }
            }
        }
    }
}
