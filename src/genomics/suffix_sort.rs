//! Cyclic suffix array construction by bucket refinement.
//!
//! Rotations of a sequence over `{$, A, C, G, T}` are ordered by sampling the
//! symbols at offsets `0, step, 2·step, …` (modulo the sequence length). The
//! driver keeps a worklist of *active ranges*: runs of suffix-array ranks whose
//! rotations agree on every depth processed so far. Each round it splits every
//! active range into five symbol buckets at the current depth, keeps the buckets
//! that still hold more than one rank, and advances the depth by `step`.
//!
//! Ranks that remain tied once every cyclic depth has been sampled are ordered
//! by ascending start index, which is also the tie-break used for the
//! terminator bucket.

use std::ops::Range;
use std::time::Instant;

use bitvec::prelude::*;
use rayon::prelude::*;
use thiserror::Error;
use tracing::{debug, info, trace};

use crate::genomics::{Symbol, ALPHABET_SIZE, SYMBOLS};

/// Longest sequence whose rotation starts fit in a `u32` suffix array.
pub const MAX_SEQUENCE_LEN: usize = u32::MAX as usize;

/// Errors raised while constructing a cyclic suffix array.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SortError {
    /// A byte outside `{$, A, C, G, T}` was read from the sequence.
    #[error("invalid symbol 0x{byte:02x} at sequence position {position}")]
    InvalidSymbol {
        /// Offending byte.
        byte: u8,
        /// Position within the sequence where the byte was read.
        position: usize,
    },

    /// Parameters were rejected before the suffix array was touched.
    #[error("invalid sort configuration: {0}")]
    InvalidConfiguration(String),
}

impl SortError {
    fn config(msg: impl Into<String>) -> Self {
        SortError::InvalidConfiguration(msg.into())
    }
}

/// Occurrences of each alphabet symbol within a range, in bucket order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BucketCounts([usize; ALPHABET_SIZE]);

impl BucketCounts {
    /// Wrap raw counts ordered `$, A, C, G, T`.
    pub fn from_array(counts: [usize; ALPHABET_SIZE]) -> Self {
        Self(counts)
    }

    /// Count recorded for `symbol`.
    #[inline]
    pub fn get(&self, symbol: Symbol) -> usize {
        self.0[symbol.rank()]
    }

    /// Sum of all five counts.
    pub fn total(&self) -> usize {
        self.0.iter().sum()
    }

    /// Raw counts ordered `$, A, C, G, T`.
    pub fn as_array(&self) -> &[usize; ALPHABET_SIZE] {
        &self.0
    }

    /// Half-open bucket bounds, relative to the start of the counted range.
    pub fn buckets(&self) -> impl Iterator<Item = (Symbol, Range<usize>)> + '_ {
        let mut begin = 0;
        SYMBOLS.into_iter().map(move |symbol| {
            let end = begin + self.get(symbol);
            let bucket = begin..end;
            begin = end;
            (symbol, bucket)
        })
    }
}

/// Summary of a completed construction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SortStats {
    /// Number of refinement rounds executed.
    pub rounds: usize,
    /// Largest number of active ranges seen at the start of a round.
    pub max_active_ranges: usize,
    /// Depth at which refinement stopped.
    pub final_depth: usize,
    /// Ranks still tied after every cyclic depth was sampled.
    pub unresolved_ties: usize,
}

/// Symbol of the rotation at `rank`, sampled `depth` positions past its start.
///
/// Addressing is cyclic, so any `depth` is valid.
///
/// # Panics
/// Panics if `rank` is outside `suffix_array` or `sequence` is empty.
#[inline]
pub fn symbol_at(
    sequence: &[u8],
    suffix_array: &[u32],
    rank: usize,
    depth: usize,
) -> Result<Symbol, SortError> {
    let len = sequence.len();
    let position = (suffix_array[rank] as usize % len + depth % len) % len;
    let byte = sequence[position];
    Symbol::from_ascii(byte).ok_or(SortError::InvalidSymbol { byte, position })
}

/// Count the symbols found at `depth` for every rank in `range`.
pub fn count_buckets(
    sequence: &[u8],
    suffix_array: &[u32],
    depth: usize,
    range: Range<usize>,
) -> Result<BucketCounts, SortError> {
    check_range(sequence, suffix_array, &range)?;
    count_slice(sequence, &suffix_array[range], depth)
}

/// Reorder `range` in place so that each symbol at `depth` forms one contiguous
/// bucket, in alphabet order. The terminator bucket ends up sorted by start
/// index. `counts` must come from [`count_buckets`] on the same range.
pub fn partition_range(
    sequence: &[u8],
    suffix_array: &mut [u32],
    depth: usize,
    range: Range<usize>,
    counts: &BucketCounts,
) -> Result<(), SortError> {
    check_range(sequence, suffix_array, &range)?;
    if counts.total() != range.len() {
        return Err(SortError::config(format!(
            "bucket counts sum to {} but range holds {} ranks",
            counts.total(),
            range.len()
        )));
    }
    if depth >= sequence.len() || range.len() <= 1 {
        return Ok(());
    }
    partition_slice(sequence, &mut suffix_array[range], depth, counts)
}

/// Sort `suffix_array` (any permutation of `0..sequence.len()`) into cyclic
/// order sampled every `step` positions.
pub fn sort_suffix_array(
    sequence: &[u8],
    suffix_array: &mut [u32],
    step: usize,
) -> Result<SortStats, SortError> {
    CyclicSuffixSorter::new(sequence, step)?.sort(suffix_array)
}

/// Configured cyclic suffix sorter over a borrowed sequence.
#[derive(Debug, Clone)]
pub struct CyclicSuffixSorter<'a> {
    sequence: &'a [u8],
    step: usize,
    parallel: bool,
}

impl<'a> CyclicSuffixSorter<'a> {
    /// Validate the sequence length and step.
    pub fn new(sequence: &'a [u8], step: usize) -> Result<Self, SortError> {
        if step == 0 {
            return Err(SortError::config("step must be greater than zero"));
        }
        if sequence.is_empty() {
            return Err(SortError::config("sequence must be non-empty"));
        }
        if sequence.len() > MAX_SEQUENCE_LEN {
            return Err(SortError::config(format!(
                "sequence length {} exceeds maximum {}",
                sequence.len(),
                MAX_SEQUENCE_LEN
            )));
        }
        Ok(Self {
            sequence,
            step,
            parallel: false,
        })
    }

    /// Refine the ranges of each round on the rayon pool.
    pub fn parallel(mut self, enabled: bool) -> Self {
        self.parallel = enabled;
        self
    }

    /// Sampling step.
    pub fn step(&self) -> usize {
        self.step
    }

    /// Length of the sequence being sorted.
    pub fn len(&self) -> usize {
        self.sequence.len()
    }

    /// Always `false`; empty sequences are rejected by [`Self::new`].
    pub fn is_empty(&self) -> bool {
        self.sequence.is_empty()
    }

    /// Sort a fresh identity suffix array.
    pub fn build(&self) -> Result<(Vec<u32>, SortStats), SortError> {
        let mut suffix_array: Vec<u32> = (0..self.sequence.len() as u32).collect();
        let stats = self.sort(&mut suffix_array)?;
        Ok((suffix_array, stats))
    }

    /// Sort `suffix_array` in place.
    ///
    /// The array is validated before any mutation. An [`SortError::InvalidSymbol`]
    /// aborts construction and leaves the array partially reordered.
    pub fn sort(&self, suffix_array: &mut [u32]) -> Result<SortStats, SortError> {
        validate_permutation(suffix_array, self.sequence.len())?;

        let len = self.sequence.len();
        let started = Instant::now();
        info!(
            length = len,
            step = self.step,
            parallel = self.parallel,
            "sorting cyclic suffix array"
        );

        let mut stats = SortStats::default();
        let mut ranges: Vec<Range<usize>> = Vec::new();
        if len > 1 {
            ranges.push(0..len);
        }

        let mut depth = 0usize;
        while depth < len && !ranges.is_empty() {
            stats.rounds += 1;
            stats.max_active_ranges = stats.max_active_ranges.max(ranges.len());
            debug!(
                depth,
                active_ranges = ranges.len(),
                largest = ranges.iter().map(|r| r.len()).max().unwrap_or(0),
                "refinement round"
            );

            ranges = if self.parallel && ranges.len() > 1 {
                refine_round_parallel(self.sequence, suffix_array, &ranges, depth)?
            } else {
                refine_round(self.sequence, suffix_array, &ranges, depth)?
            };
            depth = depth.saturating_add(self.step);
        }

        // Whatever is still tied compares equal at every sampled depth.
        for range in &ranges {
            suffix_array[range.clone()].sort_unstable();
        }

        stats.final_depth = depth;
        stats.unresolved_ties = ranges.iter().map(|r| r.len()).sum();
        info!(
            rounds = stats.rounds,
            max_active_ranges = stats.max_active_ranges,
            unresolved_ties = stats.unresolved_ties,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "cyclic suffix array sorted"
        );
        Ok(stats)
    }
}

/// Check that `suffix_array` holds each of `0..len` exactly once.
pub fn validate_permutation(suffix_array: &[u32], len: usize) -> Result<(), SortError> {
    if suffix_array.len() != len {
        return Err(SortError::config(format!(
            "suffix array holds {} entries but sequence length is {}",
            suffix_array.len(),
            len
        )));
    }
    let mut seen = bitvec![0; len];
    for &start in suffix_array {
        let start = start as usize;
        if start >= len || seen[start] {
            return Err(SortError::config(format!(
                "suffix array is not a permutation of 0..{len} (entry {start})"
            )));
        }
        seen.set(start, true);
    }
    Ok(())
}

fn check_range(
    sequence: &[u8],
    suffix_array: &[u32],
    range: &Range<usize>,
) -> Result<(), SortError> {
    if sequence.is_empty() {
        return Err(SortError::config("sequence must be non-empty"));
    }
    if range.start > range.end || range.end > suffix_array.len() {
        return Err(SortError::config(format!(
            "range {}..{} outside suffix array of length {}",
            range.start,
            range.end,
            suffix_array.len()
        )));
    }
    Ok(())
}

fn count_slice(sequence: &[u8], ranks: &[u32], depth: usize) -> Result<BucketCounts, SortError> {
    let mut counts = [0usize; ALPHABET_SIZE];
    for rank in 0..ranks.len() {
        counts[symbol_at(sequence, ranks, rank, depth)?.rank()] += 1;
    }
    Ok(BucketCounts(counts))
}

/// One pass per symbol over the unfilled tail, swapping matches into place.
/// The last symbol is scanned like the others so that counts which disagree
/// with the data are reported instead of trusted.
fn partition_slice(
    sequence: &[u8],
    ranks: &mut [u32],
    depth: usize,
    counts: &BucketCounts,
) -> Result<(), SortError> {
    let mut fill = 0usize;
    for symbol in SYMBOLS {
        let bucket_end = fill + counts.get(symbol);
        let mut scan = fill;
        while fill < bucket_end {
            if scan == ranks.len() {
                return Err(SortError::config(format!(
                    "bucket count for {:?} exceeds its occurrences at depth {depth}",
                    symbol
                )));
            }
            if symbol_at(sequence, ranks, scan, depth)? == symbol {
                ranks.swap(fill, scan);
                fill += 1;
            }
            scan += 1;
        }
        if symbol == Symbol::Terminator && bucket_end > 1 {
            ranks[..bucket_end].sort_unstable();
        }
    }
    debug_assert_eq!(fill, ranks.len());
    Ok(())
}

/// Partition one active range and return its still-tied buckets, relative to
/// the start of `ranks`.
fn refine_slice(
    sequence: &[u8],
    ranks: &mut [u32],
    depth: usize,
) -> Result<Vec<Range<usize>>, SortError> {
    let counts = count_slice(sequence, ranks, depth)?;
    partition_slice(sequence, ranks, depth, &counts)?;
    trace!(depth, size = ranks.len(), counts = ?counts.as_array(), "range partitioned");
    Ok(counts
        .buckets()
        .filter(|(_, bucket)| bucket.len() > 1)
        .map(|(_, bucket)| bucket)
        .collect())
}

fn refine_round(
    sequence: &[u8],
    suffix_array: &mut [u32],
    ranges: &[Range<usize>],
    depth: usize,
) -> Result<Vec<Range<usize>>, SortError> {
    let mut next = Vec::with_capacity(ranges.len());
    for range in ranges {
        let begin = range.start;
        let ties = refine_slice(sequence, &mut suffix_array[range.clone()], depth)?;
        next.extend(ties.into_iter().map(|t| begin + t.start..begin + t.end));
    }
    Ok(next)
}

/// Same as [`refine_round`], with each range handed to rayon as its own
/// disjoint slice. `ranges` must be sorted and non-overlapping.
fn refine_round_parallel(
    sequence: &[u8],
    suffix_array: &mut [u32],
    ranges: &[Range<usize>],
    depth: usize,
) -> Result<Vec<Range<usize>>, SortError> {
    let mut slices = Vec::with_capacity(ranges.len());
    let mut rest = suffix_array;
    let mut offset = 0usize;
    for range in ranges {
        debug_assert!(range.start >= offset);
        let (_, tail) = std::mem::take(&mut rest).split_at_mut(range.start - offset);
        let (slice, tail) = tail.split_at_mut(range.len());
        slices.push((range.start, slice));
        rest = tail;
        offset = range.end;
    }

    let refined = slices
        .into_par_iter()
        .map(|(begin, slice)| {
            refine_slice(sequence, slice, depth).map(|ties| {
                ties.into_iter()
                    .map(|t| begin + t.start..begin + t.end)
                    .collect::<Vec<_>>()
            })
        })
        .collect::<Result<Vec<_>, SortError>>()?;
    Ok(refined.into_iter().flatten().collect())
}
