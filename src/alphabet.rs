//! The nucleotide alphabet: dense symbol ranks

/// Number of real nucleotides (A, C, G, T); the vocabulary size used for
/// the theoretical maximum of distinct k-mers.
pub const NUCLEOTIDES: usize = 4;

/// Rank given to every symbol that is not A, C, G or T.
pub const AMBIGUOUS: u8 = 4;

/// Bits used per symbol in a packed k-mer code. Two bits would be enough for
/// the nucleotides alone, the third one keeps the ambiguous rank distinct.
pub const BITS_PER_SYMBOL: u32 = 3;

/// Longest k-mer whose packed code still fits a `u64`.
pub const MAX_K: usize = (u64::BITS / BITS_PER_SYMBOL) as usize;

const RANK_LOOKUP: [u8; 256] = {
    let mut lookup = [AMBIGUOUS; 256];

    lookup[b'A' as usize] = 0;
    lookup[b'C' as usize] = 1;
    lookup[b'G' as usize] = 2;
    lookup[b'T' as usize] = 3;
    lookup[b'a' as usize] = 0;
    lookup[b'c' as usize] = 1;
    lookup[b'g' as usize] = 2;
    lookup[b't' as usize] = 3;

    lookup
};

/// Maps a nucleotide to its rank: A=0, C=1, G=2, T=3 (either case) and
/// anything else to [`AMBIGUOUS`]. Never fails.
#[inline]
pub fn rank(nuc: u8) -> u8 {
    RANK_LOOKUP[nuc as usize]
}

/// Inverse of [`rank`] for the canonical uppercase letters; the ambiguous
/// rank comes back as `N`.
#[inline]
pub fn symbol(rank: u8) -> u8 {
    match rank {
        0 => b'A',
        1 => b'C',
        2 => b'G',
        3 => b'T',
        _ => b'N',
    }
}

#[inline]
pub fn is_gc(nuc: u8) -> bool {
    matches!(nuc, b'G' | b'C' | b'g' | b'c')
}
