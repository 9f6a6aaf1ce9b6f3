//! Direct comparator over sampled rotations.
//!
//! Quadratic on periodic input; used to verify the refinement engine, never to
//! build an index.

use std::cmp::Ordering;

/// Compare the rotations starting at `lhs` and `rhs` on positions
/// `0, step, 2·step, …` below the sequence length, then by start index.
///
/// # Panics
/// Panics if `step` is zero or either start lies outside `sequence`.
pub fn compare_rotations(sequence: &[u8], step: usize, lhs: usize, rhs: usize) -> Ordering {
    assert!(step > 0, "step must be greater than zero");
    let len = sequence.len();
    (0..len)
        .step_by(step)
        .map(|depth| sequence[(lhs + depth) % len].cmp(&sequence[(rhs + depth) % len]))
        .find(|ordering| ordering.is_ne())
        .unwrap_or_else(|| lhs.cmp(&rhs))
}

/// Suffix array obtained by sorting every rotation with [`compare_rotations`].
pub fn comparator_suffix_array(sequence: &[u8], step: usize) -> Vec<u32> {
    let mut suffix_array: Vec<u32> = (0..sequence.len() as u32).collect();
    suffix_array.sort_by(|&a, &b| compare_rotations(sequence, step, a as usize, b as usize));
    suffix_array
}

/// Returns `true` when consecutive ranks are strictly increasing under
/// [`compare_rotations`].
pub fn is_cyclically_sorted(sequence: &[u8], step: usize, suffix_array: &[u32]) -> bool {
    suffix_array.windows(2).all(|pair| {
        compare_rotations(sequence, step, pair[0] as usize, pair[1] as usize) == Ordering::Less
    })
}
