use std::collections::HashSet;
use std::fs;

use blake3::hash;
use sbwt::genomics::{
    comparator_suffix_array, prepare_reference, CyclicIndex, IndexConfig, IndexError, PackedDna,
    ReaderError, SequenceReader,
};

mod common;
use common::{fasta, mock_reference};

#[test]
fn builds_persists_and_reloads_from_fasta() {
    let dir = tempfile::tempdir().expect("temp dir");
    let reference = mock_reference(600, 13);
    let ref_path = dir.path().join("test_ref.fa");
    fs::write(&ref_path, fasta("ref", &reference, 60)).expect("write reference");

    let config = IndexConfig::with_step(3).expect("valid step");
    let index = CyclicIndex::from_fasta(&ref_path, &config).expect("index builds");
    assert_eq!(index.len(), reference.len() + 3);
    assert!(index.verify());

    index.write_to(&ref_path).expect("index written");
    assert!(dir.path().join("test_ref.fa.3.array.sbwt").is_file());
    assert!(dir.path().join("test_ref.fa.3.meta.sbwt").is_file());

    let loaded = CyclicIndex::read_from(&ref_path, &reference, &config).expect("index loads");
    assert_eq!(loaded.suffix_array(), index.suffix_array());
    assert_eq!(loaded.sequence(), index.sequence());
    assert_eq!(loaded.step(), 3);
}

#[test]
fn reload_rejects_a_different_reference() {
    let dir = tempfile::tempdir().expect("temp dir");
    let prefix = dir.path().join("ref");
    let config = IndexConfig::with_step(2).expect("valid step");

    let reference = mock_reference(120, 7);
    CyclicIndex::build(&reference, &config)
        .expect("index builds")
        .write_to(&prefix)
        .expect("index written");

    let mut other = reference.clone();
    other[5] = if other[5] == b'A' { b'C' } else { b'A' };
    let err = CyclicIndex::read_from(&prefix, &other, &config).unwrap_err();
    assert!(matches!(err, IndexError::CorruptIndex(_)));

    let shorter = &reference[..100];
    let err = CyclicIndex::read_from(&prefix, shorter, &config).unwrap_err();
    assert!(matches!(err, IndexError::CorruptIndex(_)));
}

#[test]
fn reload_rejects_truncated_array() {
    let dir = tempfile::tempdir().expect("temp dir");
    let prefix = dir.path().join("ref");
    let config = IndexConfig::with_step(1).expect("valid step");
    let reference = mock_reference(50, 3);
    CyclicIndex::build(&reference, &config)
        .expect("index builds")
        .write_to(&prefix)
        .expect("index written");

    let array_path = CyclicIndex::array_path(&prefix, 1);
    let bytes = fs::read(&array_path).expect("array readable");
    fs::write(&array_path, &bytes[..bytes.len() - 4]).expect("array truncated");

    let err = CyclicIndex::read_from(&prefix, &reference, &config).unwrap_err();
    assert!(matches!(err, IndexError::CorruptIndex(_)));
}

#[test]
fn reload_rejects_duplicated_rotation_start() {
    let dir = tempfile::tempdir().expect("temp dir");
    let prefix = dir.path().join("ref");
    let config = IndexConfig::with_step(1).expect("valid step");
    let reference = mock_reference(50, 3);
    CyclicIndex::build(&reference, &config)
        .expect("index builds")
        .write_to(&prefix)
        .expect("index written");

    let array_path = CyclicIndex::array_path(&prefix, 1);
    let mut bytes = fs::read(&array_path).expect("array readable");
    bytes.copy_within(0..4, 4);
    fs::write(&array_path, &bytes).expect("array rewritten");

    let err = CyclicIndex::read_from(&prefix, &reference, &config).unwrap_err();
    assert!(matches!(err, IndexError::CorruptIndex(_)), "got {err:?}");
}

#[test]
fn missing_files_report_the_path() {
    let dir = tempfile::tempdir().expect("temp dir");
    let prefix = dir.path().join("absent");
    let config = IndexConfig::with_step(1).expect("valid step");
    let err = CyclicIndex::read_from(&prefix, b"ACGT", &config).unwrap_err();
    match err {
        IndexError::Io { path, operation, .. } => {
            assert_eq!(path, CyclicIndex::meta_path(&prefix, 1));
            assert_eq!(operation, "read");
        }
        other => panic!("expected i/o error, got {other:?}"),
    }
}

#[test]
fn missing_fasta_reports_the_path() {
    let dir = tempfile::tempdir().expect("temp dir");
    let ref_path = dir.path().join("absent.fa");
    let config = IndexConfig::with_step(1).expect("valid step");
    let err = CyclicIndex::from_fasta(&ref_path, &config).unwrap_err();
    match &err {
        IndexError::Reader(ReaderError::Open { path, .. }) => assert_eq!(path, &ref_path),
        other => panic!("expected open error, got {other:?}"),
    }
    assert!(err.to_string().contains("absent.fa"));
}

#[test]
fn empty_fasta_is_rejected() {
    let dir = tempfile::tempdir().expect("temp dir");
    let ref_path = dir.path().join("empty.fa");
    fs::write(&ref_path, "\n").expect("write reference");
    let config = IndexConfig::with_step(1).expect("valid step");
    assert!(matches!(
        CyclicIndex::from_fasta(&ref_path, &config),
        Err(IndexError::EmptyReference)
    ));
}

#[test]
fn packed_reads_feed_the_sorter() {
    let reads = ">r0\nGATTACA\n>r1\nACAACGCCAA\n";
    let config = IndexConfig::with_step(2).expect("valid step");
    for record in SequenceReader::new(reads.as_bytes()) {
        let record = record.expect("record parses");
        let packed = PackedDna::pack(&record.sequence).expect("bases pack");

        for strand in [packed.clone(), packed.reverse_complement()] {
            let index = CyclicIndex::build(&strand.unpack(), &config).expect("index builds");
            let prepared = prepare_reference(&strand.unpack(), &config).expect("prepared");
            assert_eq!(index.suffix_array(), comparator_suffix_array(&prepared, 2).as_slice());
        }
    }
}

#[test]
fn parallel_and_sequential_builds_are_identical() {
    let reference = mock_reference(2_000, 42);
    let mut fingerprints = HashSet::new();
    for parallel in [false, true, true, false] {
        let config = IndexConfig::with_step(3)
            .expect("valid step")
            .with_parallel(parallel);
        let index = CyclicIndex::build(&reference, &config).expect("index builds");
        let bytes: Vec<u8> = index
            .suffix_array()
            .iter()
            .flat_map(|start| start.to_le_bytes())
            .collect();
        fingerprints.insert(hash(&bytes));
    }
    assert_eq!(fingerprints.len(), 1, "outputs diverged across runs");
}
