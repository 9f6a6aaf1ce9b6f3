use std::fmt;

use thiserror::Error;

use crate::genomics::Symbol;

/// Number of bases encoded per `u64` word.
const BASES_PER_WORD: usize = 32;
/// Bits used to encode a single DNA base (A/C/G/T).
const BITS_PER_BASE: usize = 2;
const BASE_MASK: u64 = 0b11;

/// Errors that can occur while packing DNA.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PackedDnaError {
    /// Encountered a byte that has no 2-bit code.
    #[error("unsupported nucleotide '{0}' at position {1}")]
    UnsupportedBase(char, usize),

    /// Appending would exceed the capacity fixed at construction.
    #[error("packed sequence capacity exceeded: requested {requested}, capacity {capacity}")]
    CapacityExceeded {
        /// Length the operation needed.
        requested: usize,
        /// Maximum number of bases the buffer holds.
        capacity: usize,
    },

    /// Construction parameters were rejected.
    #[error("invalid packed sequence configuration: {0}")]
    InvalidConfiguration(String),
}

/// DNA sequence packed at 2 bits per base into an explicitly sized buffer.
///
/// The word buffer is allocated once from the maximum supported length and
/// never grows; pushes past that length fail with
/// [`PackedDnaError::CapacityExceeded`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackedDna {
    words: Vec<u64>,
    len: usize,
    capacity: usize,
}

impl PackedDna {
    /// Allocate room for up to `max_len` bases.
    pub fn with_capacity(max_len: usize) -> Result<Self, PackedDnaError> {
        if max_len == 0 {
            return Err(PackedDnaError::InvalidConfiguration(
                "maximum sequence length must be > 0".to_string(),
            ));
        }
        Ok(Self {
            words: vec![0; words_for_len(max_len)],
            len: 0,
            capacity: max_len,
        })
    }

    /// Pack an ASCII sequence, sized exactly to its length.
    pub fn pack(sequence: &[u8]) -> Result<Self, PackedDnaError> {
        let mut packed = Self::with_capacity(sequence.len())?;
        packed.extend_from_slice(sequence)?;
        Ok(packed)
    }

    /// Number of bases stored.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns `true` when no base has been stored.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Maximum number of bases this buffer holds.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Packed words, little-endian base order.
    pub fn words(&self) -> &[u64] {
        &self.words
    }

    /// Append a single base.
    pub fn push(&mut self, base: u8) -> Result<(), PackedDnaError> {
        let idx = self.len;
        if idx >= self.capacity {
            return Err(PackedDnaError::CapacityExceeded {
                requested: idx + 1,
                capacity: self.capacity,
            });
        }
        let code = encode_base(base).ok_or(PackedDnaError::UnsupportedBase(base as char, idx))?;
        let (word_idx, bit_shift) = word_position(idx);
        self.words[word_idx] &= !(BASE_MASK << bit_shift);
        self.words[word_idx] |= code << bit_shift;
        self.len += 1;
        Ok(())
    }

    /// Append every base of `sequence`. Nothing is written if the whole slice
    /// does not fit.
    pub fn extend_from_slice(&mut self, sequence: &[u8]) -> Result<(), PackedDnaError> {
        let requested = self.len + sequence.len();
        if requested > self.capacity {
            return Err(PackedDnaError::CapacityExceeded {
                requested,
                capacity: self.capacity,
            });
        }
        for &base in sequence {
            self.push(base)?;
        }
        Ok(())
    }

    /// Base at `idx` as an uppercase ASCII byte.
    pub fn base_at(&self, idx: usize) -> Option<u8> {
        (idx < self.len).then(|| decode_base(self.code_at(idx)))
    }

    /// Base at `idx` as an index [`Symbol`].
    pub fn symbol_at(&self, idx: usize) -> Option<Symbol> {
        self.base_at(idx).and_then(Symbol::from_ascii)
    }

    /// Decode into a flat ASCII buffer.
    pub fn unpack(&self) -> Vec<u8> {
        (0..self.len).map(|idx| decode_base(self.code_at(idx))).collect()
    }

    /// Decode into `out`, which must hold at least `self.len()` bytes.
    pub fn unpack_into(&self, out: &mut [u8]) -> Result<(), PackedDnaError> {
        if out.len() < self.len {
            return Err(PackedDnaError::CapacityExceeded {
                requested: self.len,
                capacity: out.len(),
            });
        }
        for (idx, slot) in out[..self.len].iter_mut().enumerate() {
            *slot = decode_base(self.code_at(idx));
        }
        Ok(())
    }

    /// Reverse complement with the same capacity.
    pub fn reverse_complement(&self) -> Self {
        let mut out = Self {
            words: vec![0; self.words.len()],
            len: self.len,
            capacity: self.capacity,
        };
        for idx in 0..self.len {
            let code = self.code_at(self.len - 1 - idx) ^ BASE_MASK;
            let (word_idx, bit_shift) = word_position(idx);
            out.words[word_idx] |= code << bit_shift;
        }
        out
    }

    /// Iterate over decoded bases.
    pub fn iter(&self) -> impl Iterator<Item = u8> + '_ {
        (0..self.len).map(move |idx| decode_base(self.code_at(idx)))
    }

    fn code_at(&self, idx: usize) -> u64 {
        let (word_idx, bit_shift) = word_position(idx);
        (self.words[word_idx] >> bit_shift) & BASE_MASK
    }
}

impl fmt::Display for PackedDna {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let decoded = self.unpack();
        write!(f, "{}", String::from_utf8_lossy(&decoded))
    }
}

fn encode_base(base: u8) -> Option<u64> {
    match base {
        b'A' | b'a' => Some(0),
        b'C' | b'c' => Some(1),
        b'G' | b'g' => Some(2),
        b'T' | b't' => Some(3),
        _ => None,
    }
}

fn decode_base(code: u64) -> u8 {
    match code {
        0 => b'A',
        1 => b'C',
        2 => b'G',
        _ => b'T',
    }
}

fn words_for_len(len: usize) -> usize {
    (len + BASES_PER_WORD - 1) / BASES_PER_WORD
}

fn word_position(idx: usize) -> (usize, usize) {
    (idx / BASES_PER_WORD, (idx % BASES_PER_WORD) * BITS_PER_BASE)
}
