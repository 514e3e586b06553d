//! Compact rolling codes for nucleic acid kmers, 3 bits per base
use crate::alphabet::{rank, symbol, BITS_PER_SYMBOL};

pub type KmerCode = u64;

/// Bitmask keeping the low `k * BITS_PER_SYMBOL` bits of a code.
#[inline]
pub fn mask(k: u8) -> KmerCode {
    debug_assert!(k as usize <= crate::alphabet::MAX_K);
    (1 << (u32::from(k) * BITS_PER_SYMBOL)) - 1
}

/// Packs a whole kmer into one code, first base in the most significant bits.
pub fn hash_of(kmer: &[u8]) -> KmerCode {
    kmer.iter().fold(0, |code, &n| {
        (code << BITS_PER_SYMBOL) + KmerCode::from(rank(n))
    })
}

/// Shifts a new rank onto the end of `code`. The mask drops whatever falls
/// off the front, so the outgoing base never has to be known.
#[inline]
pub fn extend(code: KmerCode, new_rank: u8, k: u8) -> KmerCode {
    ((code << BITS_PER_SYMBOL) + KmerCode::from(new_rank)) & mask(k)
}

/// Unpacks a code back into bases (ambiguous ranks come out as `N`).
pub fn code_to_bytes(code: KmerCode, k: u8) -> Vec<u8> {
    let sym_mask = (1 << BITS_PER_SYMBOL) - 1;
    (0..u32::from(k))
        .rev()
        .map(|i| symbol(((code >> (i * BITS_PER_SYMBOL)) & sym_mask) as u8))
        .collect()
}

/// Iterator over the codes of every kmer of a slice, in order. Unlike the
/// 2-bit kmerizers nothing is skipped: ambiguous bases are part of the code.
pub struct RollingKmers<'a> {
    k: u8,
    pos: usize,
    code: KmerCode,
    buffer: &'a [u8],
}

impl<'a> RollingKmers<'a> {
    pub fn new(buffer: &'a [u8], k: u8) -> RollingKmers<'a> {
        let seed = (k as usize).saturating_sub(1).min(buffer.len());
        RollingKmers {
            k,
            pos: seed,
            code: hash_of(&buffer[..seed]),
            buffer,
        }
    }
}

impl Iterator for RollingKmers<'_> {
    type Item = KmerCode;

    fn next(&mut self) -> Option<KmerCode> {
        if self.k == 0 || self.pos >= self.buffer.len() {
            return None;
        }
        self.code = extend(self.code, rank(self.buffer[self.pos]), self.k);
        self.pos += 1;
        Some(self.code)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let left = if self.k == 0 {
            0
        } else {
            self.buffer.len() - self.pos
        };
        (left, Some(left))
    }
}

impl ExactSizeIterator for RollingKmers<'_> {}
