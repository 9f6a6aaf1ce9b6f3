use proptest::prelude::*;
use sbwt::genomics::{comparator_suffix_array, sort_suffix_array, CyclicSuffixSorter};

mod common;
use common::{identity, periodic_sequence};

fn symbols() -> impl Strategy<Value = u8> {
    prop_oneof![
        1 => Just(b'$'),
        3 => Just(b'A'),
        3 => Just(b'C'),
        3 => Just(b'G'),
        3 => Just(b'T'),
    ]
}

fn sequence_and_step() -> impl Strategy<Value = (Vec<u8>, usize)> {
    (proptest::collection::vec(symbols(), 1..64), 1usize..8)
}

fn sequence_with_shuffled_array() -> impl Strategy<Value = (Vec<u8>, Vec<u32>, usize)> {
    sequence_and_step().prop_flat_map(|(sequence, step)| {
        let initial = Just(identity(sequence.len())).prop_shuffle();
        (Just(sequence), initial, Just(step))
    })
}

fn periodic_input() -> impl Strategy<Value = (Vec<u8>, usize)> {
    (
        proptest::collection::vec(symbols(), 1..6),
        1usize..12,
        0usize..4,
        1usize..6,
    )
        .prop_map(|(unit, copies, terminators, step)| {
            (periodic_sequence(&unit, copies, terminators), step)
        })
}

fn is_permutation(suffix_array: &[u32]) -> bool {
    let mut sorted = suffix_array.to_vec();
    sorted.sort_unstable();
    sorted == identity(suffix_array.len())
}

proptest! {
    #[test]
    fn output_is_a_permutation((sequence, step) in sequence_and_step()) {
        let mut sa = identity(sequence.len());
        sort_suffix_array(&sequence, &mut sa, step).expect("sort succeeds");
        prop_assert!(is_permutation(&sa));
    }

    #[test]
    fn matches_comparator_oracle((sequence, step) in sequence_and_step()) {
        let mut sa = identity(sequence.len());
        sort_suffix_array(&sequence, &mut sa, step).expect("sort succeeds");
        prop_assert_eq!(sa, comparator_suffix_array(&sequence, step));
    }

    #[test]
    fn initial_permutation_does_not_matter((sequence, initial, step) in sequence_with_shuffled_array()) {
        let mut sa = initial;
        sort_suffix_array(&sequence, &mut sa, step).expect("sort succeeds");
        prop_assert_eq!(sa, comparator_suffix_array(&sequence, step));
    }

    #[test]
    fn resorting_is_a_fixed_point((sequence, step) in sequence_and_step()) {
        let mut sa = identity(sequence.len());
        sort_suffix_array(&sequence, &mut sa, step).expect("first sort succeeds");
        let first = sa.clone();
        sort_suffix_array(&sequence, &mut sa, step).expect("second sort succeeds");
        prop_assert_eq!(sa, first);
    }

    #[test]
    fn periodic_inputs_match_oracle((sequence, step) in periodic_input()) {
        let (sa, stats) = CyclicSuffixSorter::new(&sequence, step)
            .expect("valid parameters")
            .build()
            .expect("sort succeeds");
        prop_assert_eq!(sa, comparator_suffix_array(&sequence, step));
        prop_assert!(stats.rounds <= (sequence.len() + step - 1) / step);
    }

    #[test]
    fn parallel_matches_sequential((sequence, step) in sequence_and_step()) {
        let sorter = CyclicSuffixSorter::new(&sequence, step).expect("valid parameters");
        let (sequential, _) = sorter.build().expect("sequential sort succeeds");
        let (parallel, _) = sorter.parallel(true).build().expect("parallel sort succeeds");
        prop_assert_eq!(sequential, parallel);
    }
}

#[test]
fn step_changes_the_comparison_key() {
    let sequence = b"ACAACGCCAA$$";
    let mut even = identity(sequence.len());
    let mut full = identity(sequence.len());
    sort_suffix_array(sequence, &mut even, 2).expect("step 2 succeeds");
    sort_suffix_array(sequence, &mut full, 1).expect("step 1 succeeds");

    assert_eq!(even, comparator_suffix_array(sequence, 2));
    assert_eq!(full, comparator_suffix_array(sequence, 1));
    assert_ne!(even, full);
}

#[test]
fn gattaca_end_to_end() {
    let sequence = b"GATTACA";
    let mut sa = identity(sequence.len());
    sort_suffix_array(sequence, &mut sa, 1).expect("sort succeeds");
    assert_eq!(sa, comparator_suffix_array(sequence, 1));
}

#[test]
fn degenerate_sequences_sort_to_identity() {
    for sequence in [b"AAAA", b"ACGT"] {
        let mut sa = vec![3, 1, 2, 0];
        sort_suffix_array(sequence, &mut sa, 1).expect("sort succeeds");
        assert_eq!(sa, vec![0, 1, 2, 3]);
    }
}

#[test]
fn single_position_is_unchanged_for_any_step() {
    for step in [1, 2, 7, 1_000] {
        let mut sa = vec![0];
        sort_suffix_array(b"$", &mut sa, step).expect("sort succeeds");
        assert_eq!(sa, vec![0]);
    }
}

#[test]
fn step_longer_than_sequence_compares_first_symbol_only() {
    let sequence = b"CACGA";
    let mut sa = identity(sequence.len());
    let stats = sort_suffix_array(sequence, &mut sa, 10).expect("sort succeeds");
    assert_eq!(sa, vec![1, 4, 0, 2, 3]);
    assert_eq!(stats.rounds, 1);
}
