//! # Cyclic Suffix Arrays for DNA Search
//!
//! This library orders every rotation of a DNA sequence over the alphabet
//! `{$, A, C, G, T}`, comparing rotations only at positions `0, step, 2·step, …`
//! (cyclically). The resulting suffix array backs BWT-style pattern search.
//!
//! ## Core Algorithm
//!
//! 1. **Symbol access**: read the symbol `depth` positions past a rotation start, modulo `L`
//! 2. **Bucket counting**: tally `$, A, C, G, T` over an active range
//! 3. **Range partitioning**: swap each range into five contiguous buckets
//! 4. **Refinement**: keep tied buckets as active ranges, advance depth by `step`
//!
//! Ranks still tied once every sampled depth is exhausted are ordered by start
//! index.
//!
//! ## Usage Example
//!
//! ```
//! use sbwt::genomics::{comparator_suffix_array, sort_suffix_array};
//!
//! let sequence = b"GATTACA";
//! let mut suffix_array: Vec<u32> = (0..sequence.len() as u32).collect();
//! sort_suffix_array(sequence, &mut suffix_array, 1)?;
//! assert_eq!(suffix_array, comparator_suffix_array(sequence, 1));
//! # Ok::<(), sbwt::genomics::SortError>(())
//! ```

#![warn(missing_docs, missing_debug_implementations)]

pub mod genomics;

pub use genomics::{
    sort_suffix_array, CyclicIndex, CyclicSuffixSorter, IndexConfig, SortError, SortStats, Symbol,
};
