#![allow(dead_code)]

/// Identity suffix array of length `len`.
pub fn identity(len: usize) -> Vec<u32> {
    (0..len as u32).collect()
}

/// Deterministic pseudo-random reference over A/C/G/T.
pub fn mock_reference(len: usize, seed: u64) -> Vec<u8> {
    let mut state = seed.wrapping_mul(0x9E37_79B9_7F4A_7C15) | 1;
    (0..len)
        .map(|_| {
            state ^= state << 13;
            state ^= state >> 7;
            state ^= state << 17;
            b"ACGT"[(state % 4) as usize]
        })
        .collect()
}

/// `unit` repeated `copies` times, followed by `terminators` `$` symbols.
pub fn periodic_sequence(unit: &[u8], copies: usize, terminators: usize) -> Vec<u8> {
    let mut sequence = unit.repeat(copies);
    sequence.resize(sequence.len() + terminators, b'$');
    sequence
}

/// FASTA text with a single record wrapped at `width` bases.
pub fn fasta(id: &str, sequence: &[u8], width: usize) -> String {
    let mut text = format!(">{id}\n");
    for line in sequence.chunks(width) {
        text.push_str(&String::from_utf8_lossy(line));
        text.push('\n');
    }
    text
}
