//! Handles FASTA input, optionally compressed
use std::fs::File;
use std::io::{self, Cursor, Read};
use std::path::Path;

#[cfg(feature = "compression")]
use bzip2::read::BzDecoder;
#[cfg(feature = "compression")]
use flate2::read::MultiGzDecoder;
#[cfg(feature = "compression")]
use xz2::read::XzDecoder;

use crate::errors::ParseError;

mod fasta;

pub use crate::parser::fasta::{FastaEvent, Reader as FastaReader};

// Magic bytes for each compression format
#[cfg(feature = "compression")]
const GZ_MAGIC: [u8; 2] = [0x1F, 0x8B];
#[cfg(feature = "compression")]
const BZ_MAGIC: [u8; 2] = [0x42, 0x5A];
#[cfg(feature = "compression")]
const XZ_MAGIC: [u8; 2] = [0xFD, 0x37];

#[cfg(feature = "compression")]
fn decompress<'a, R: Read + 'a>(first_two: [u8; 2], reader: R) -> Box<dyn Read + 'a> {
    match first_two {
        GZ_MAGIC => Box::new(MultiGzDecoder::new(reader)),
        BZ_MAGIC => Box::new(BzDecoder::new(reader)),
        XZ_MAGIC => Box::new(XzDecoder::new(reader)),
        _ => Box::new(reader),
    }
}

#[cfg(not(feature = "compression"))]
fn decompress<'a, R: Read + 'a>(_first_two: [u8; 2], reader: R) -> Box<dyn Read + 'a> {
    Box::new(reader)
}

/// Reads as many bytes as are available up to the size of `buf`.
fn read_prefix<R: Read>(reader: &mut R, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(ref e) if e.kind() == io::ErrorKind::Interrupted => {}
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}

/// Wraps any reader in a FASTA reader, detecting gzip, bzip2 and xz input
/// from its first two bytes (decompression needs the `compression` feature).
/// The stream does not need to be seekable.
pub fn parse_fasta_reader<'a, R: Read + 'a>(
    mut reader: R,
) -> Result<FastaReader<Box<dyn Read + 'a>>, ParseError> {
    let mut first_two = [0; 2];
    let n = read_prefix(&mut reader, &mut first_two)?;
    if n == 0 {
        return Err(ParseError::new_empty_file());
    }
    let stream = Cursor::new(first_two).take(n as u64).chain(reader);
    let inner: Box<dyn Read + 'a> = if n == 2 {
        decompress(first_two, stream)
    } else {
        Box::new(stream)
    };
    Ok(FastaReader::new(inner))
}

/// The main entry point for reading sequences from a path.
pub fn parse_fasta_file<P: AsRef<Path>>(
    path: P,
) -> Result<FastaReader<Box<dyn Read>>, ParseError> {
    let f = File::open(&path)?;
    parse_fasta_reader(f)
}

pub fn parse_fasta_stdin() -> Result<FastaReader<Box<dyn Read>>, ParseError> {
    parse_fasta_reader(io::stdin())
}
