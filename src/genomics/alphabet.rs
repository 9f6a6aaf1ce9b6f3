/// Number of symbols in the index alphabet (`$`, A, C, G, T).
pub const ALPHABET_SIZE: usize = 5;
/// Byte used for the terminator symbol.
pub const TERMINATOR_BYTE: u8 = b'$';

/// Symbols of the index alphabet, declared in lexicographic order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Symbol {
    /// Rotation terminator (`$`), ordered before every base.
    Terminator = 0,
    /// Adenine.
    A = 1,
    /// Cytosine.
    C = 2,
    /// Guanine.
    G = 3,
    /// Thymine.
    T = 4,
}

/// Every symbol in bucket order: `$` < A < C < G < T.
pub const SYMBOLS: [Symbol; ALPHABET_SIZE] =
    [Symbol::Terminator, Symbol::A, Symbol::C, Symbol::G, Symbol::T];

/// Process-wide ASCII lookup table. Only the uppercase alphabet bytes map to a
/// symbol; everything else is rejected.
pub static SYMBOL_TABLE: [Option<Symbol>; 256] = build_symbol_table();

const fn build_symbol_table() -> [Option<Symbol>; 256] {
    let mut table = [None; 256];
    table[TERMINATOR_BYTE as usize] = Some(Symbol::Terminator);
    table[b'A' as usize] = Some(Symbol::A);
    table[b'C' as usize] = Some(Symbol::C);
    table[b'G' as usize] = Some(Symbol::G);
    table[b'T' as usize] = Some(Symbol::T);
    table
}

impl Symbol {
    /// Resolve an ASCII byte through [`SYMBOL_TABLE`].
    #[inline]
    pub fn from_ascii(byte: u8) -> Option<Self> {
        SYMBOL_TABLE[byte as usize]
    }

    /// Bucket position of the symbol (its lexicographic rank).
    #[inline]
    pub fn rank(self) -> usize {
        self as usize
    }

    /// Uppercase ASCII byte for the symbol.
    pub fn to_ascii(self) -> u8 {
        match self {
            Symbol::Terminator => TERMINATOR_BYTE,
            Symbol::A => b'A',
            Symbol::C => b'C',
            Symbol::G => b'G',
            Symbol::T => b'T',
        }
    }

    /// Watson-Crick complement; the terminator complements to itself.
    pub fn complement(self) -> Self {
        match self {
            Symbol::Terminator => Symbol::Terminator,
            Symbol::A => Symbol::T,
            Symbol::C => Symbol::G,
            Symbol::G => Symbol::C,
            Symbol::T => Symbol::A,
        }
    }

    /// Returns `true` for the four nucleotides.
    pub fn is_base(self) -> bool {
        self != Symbol::Terminator
    }
}
