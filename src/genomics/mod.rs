//! DNA alphabet, cyclic suffix sorting, and the collaborators that feed it.
//!
//! The sorter in [`suffix_sort`] is the heart of the crate; the remaining
//! modules supply it with flat sequence buffers (from FASTA/FASTQ or from a
//! 2-bit packed representation) and persist what it produces.

mod alphabet;
mod index;
mod oracle;
mod packed_dna;
mod reader;
pub mod suffix_sort;

pub use alphabet::{Symbol, ALPHABET_SIZE, SYMBOLS, SYMBOL_TABLE, TERMINATOR_BYTE};
pub use index::{prepare_reference, CyclicIndex, IndexConfig, IndexError};
pub use oracle::{comparator_suffix_array, compare_rotations, is_cyclically_sorted};
pub use packed_dna::{PackedDna, PackedDnaError};
pub use reader::{ReaderError, SequenceReader, SequenceRecord};
pub use suffix_sort::{
    count_buckets, partition_range, sort_suffix_array, symbol_at, validate_permutation,
    BucketCounts, CyclicSuffixSorter, SortError, SortStats, MAX_SEQUENCE_LEN,
};
