use std::ffi::OsString;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{info, warn};

use crate::genomics::{
    is_cyclically_sorted, validate_permutation, CyclicSuffixSorter, ReaderError, SequenceReader,
    SortError, SortStats, TERMINATOR_BYTE,
};

const META_FORMAT: &str = "sbwt-cyclic-sa";
const META_VERSION: u32 = 1;

/// Errors raised while preparing, building, or persisting an index.
#[derive(Debug, Error)]
pub enum IndexError {
    /// Reference sequence was empty.
    #[error("reference sequence must be non-empty")]
    EmptyReference,

    /// Reference contained a byte that is not a nucleotide.
    #[error("unsupported character '{ch}' at position {position}")]
    UnsupportedCharacter {
        /// Character that could not be accepted.
        ch: char,
        /// Position within the reference.
        position: usize,
    },

    /// Configuration rejected before any work was done.
    #[error("invalid index configuration: {0}")]
    InvalidConfiguration(String),

    /// Suffix array construction failed.
    #[error("suffix sort error: {0}")]
    Sort(#[from] SortError),

    /// Reference input could not be parsed.
    #[error("reader error: {0}")]
    Reader(#[from] ReaderError),

    /// File system failure with path context.
    #[error("failed to {operation} {}: {source}", path.display())]
    Io {
        /// File involved.
        path: PathBuf,
        /// Operation that failed.
        operation: &'static str,
        /// Underlying error.
        source: io::Error,
    },

    /// Persisted index does not match the reference or is damaged.
    #[error("corrupt index: {0}")]
    CorruptIndex(String),
}

impl IndexError {
    fn io(path: &Path, operation: &'static str, source: io::Error) -> Self {
        IndexError::Io {
            path: path.to_path_buf(),
            operation,
            source,
        }
    }
}

/// Parameters for index construction.
#[derive(Debug, Clone)]
pub struct IndexConfig {
    /// Sampling step (period) used for rotation comparison.
    pub step: usize,
    /// Append `step` terminator symbols to the reference.
    pub terminator_padding: bool,
    /// Refine independent ranges in parallel.
    pub parallel: bool,
}

impl IndexConfig {
    /// Configuration for `step`, with terminator padding on.
    pub fn with_step(step: usize) -> Result<Self, IndexError> {
        if step == 0 {
            return Err(IndexError::InvalidConfiguration(
                "step must be > 0".to_string(),
            ));
        }
        Ok(Self {
            step,
            terminator_padding: true,
            parallel: false,
        })
    }

    /// Enable or disable terminator padding.
    pub fn with_terminator_padding(mut self, enabled: bool) -> Self {
        self.terminator_padding = enabled;
        self
    }

    /// Enable parallel refinement.
    pub fn with_parallel(mut self, enabled: bool) -> Self {
        self.parallel = enabled;
        self
    }
}

/// Reference sequence together with its sorted cyclic suffix array.
#[derive(Debug, Clone)]
pub struct CyclicIndex {
    sequence: Vec<u8>,
    suffix_array: Vec<u32>,
    step: usize,
    stats: SortStats,
}

impl CyclicIndex {
    /// Prepare `reference` and sort its rotations.
    pub fn build(reference: &[u8], config: &IndexConfig) -> Result<Self, IndexError> {
        let sequence = prepare_reference(reference, config)?;
        let sorter = CyclicSuffixSorter::new(&sequence, config.step)?.parallel(config.parallel);
        let (suffix_array, stats) = sorter.build()?;
        info!(
            length = sequence.len(),
            step = config.step,
            rounds = stats.rounds,
            "cyclic index built"
        );
        Ok(Self {
            sequence,
            suffix_array,
            step: config.step,
            stats,
        })
    }

    /// Build from the first record of a FASTA/FASTQ file.
    pub fn from_fasta(path: impl AsRef<Path>, config: &IndexConfig) -> Result<Self, IndexError> {
        let path = path.as_ref();
        let mut reader = SequenceReader::from_path(path)?;
        let record = reader.read_record()?.ok_or(IndexError::EmptyReference)?;
        if reader.read_record()?.is_some() {
            warn!(path = %path.display(), "only the first record is indexed");
        }
        info!(id = %record.id, length = record.sequence.len(), "read reference");
        Self::build(&record.sequence, config)
    }

    /// Prepared sequence (upper-cased and padded).
    pub fn sequence(&self) -> &[u8] {
        &self.sequence
    }

    /// Sorted rotation starts.
    pub fn suffix_array(&self) -> &[u32] {
        &self.suffix_array
    }

    /// Sampling step.
    pub fn step(&self) -> usize {
        self.step
    }

    /// Length of the prepared sequence.
    pub fn len(&self) -> usize {
        self.sequence.len()
    }

    /// Always `false` for a built index.
    pub fn is_empty(&self) -> bool {
        self.sequence.is_empty()
    }

    /// Construction statistics (all zero for an index loaded from disk).
    pub fn stats(&self) -> SortStats {
        self.stats
    }

    /// Check the suffix array against the direct rotation comparator.
    pub fn verify(&self) -> bool {
        is_cyclically_sorted(&self.sequence, self.step, &self.suffix_array)
    }

    /// `<prefix>.<step>.array.sbwt`
    pub fn array_path(prefix: impl AsRef<Path>, step: usize) -> PathBuf {
        suffixed(prefix.as_ref(), &format!(".{step}.array.sbwt"))
    }

    /// `<prefix>.<step>.meta.sbwt`
    pub fn meta_path(prefix: impl AsRef<Path>, step: usize) -> PathBuf {
        suffixed(prefix.as_ref(), &format!(".{step}.meta.sbwt"))
    }

    /// Write the suffix array (little-endian `u32`) and its metadata.
    pub fn write_to(&self, prefix: impl AsRef<Path>) -> Result<(), IndexError> {
        let array_path = Self::array_path(&prefix, self.step);
        let file = File::create(&array_path)
            .map_err(|e| IndexError::io(&array_path, "create", e))?;
        let mut writer = BufWriter::new(file);
        for start in &self.suffix_array {
            writer
                .write_all(&start.to_le_bytes())
                .map_err(|e| IndexError::io(&array_path, "write", e))?;
        }
        writer
            .flush()
            .map_err(|e| IndexError::io(&array_path, "write", e))?;

        let meta_path = Self::meta_path(&prefix, self.step);
        let meta = format!(
            "format={META_FORMAT}\nversion={META_VERSION}\nlength={}\nstep={}\nchecksum={}\n",
            self.sequence.len(),
            self.step,
            blake3::hash(&self.sequence).to_hex()
        );
        std::fs::write(&meta_path, meta).map_err(|e| IndexError::io(&meta_path, "write", e))?;

        info!(
            array = %array_path.display(),
            meta = %meta_path.display(),
            "index written"
        );
        Ok(())
    }

    /// Load an index written by [`Self::write_to`] for the same reference.
    pub fn read_from(
        prefix: impl AsRef<Path>,
        reference: &[u8],
        config: &IndexConfig,
    ) -> Result<Self, IndexError> {
        let sequence = prepare_reference(reference, config)?;

        let meta_path = Self::meta_path(&prefix, config.step);
        let meta = std::fs::read_to_string(&meta_path)
            .map_err(|e| IndexError::io(&meta_path, "read", e))?;
        let meta = IndexMeta::parse(&meta)?;
        if meta.step != config.step || meta.length != sequence.len() {
            return Err(IndexError::CorruptIndex(format!(
                "metadata describes length {} step {}, expected length {} step {}",
                meta.length,
                meta.step,
                sequence.len(),
                config.step
            )));
        }
        if meta.checksum != blake3::hash(&sequence).to_hex().as_str() {
            return Err(IndexError::CorruptIndex(
                "reference checksum does not match".to_string(),
            ));
        }

        let array_path = Self::array_path(&prefix, config.step);
        let bytes = std::fs::read(&array_path)
            .map_err(|e| IndexError::io(&array_path, "read", e))?;
        if bytes.len() != sequence.len() * 4 {
            return Err(IndexError::CorruptIndex(format!(
                "array file holds {} bytes, expected {}",
                bytes.len(),
                sequence.len() * 4
            )));
        }
        let suffix_array: Vec<u32> = bytes
            .chunks_exact(4)
            .map(|chunk| u32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
            .collect();
        validate_permutation(&suffix_array, sequence.len())
            .map_err(|e| IndexError::CorruptIndex(format!("{}: {e}", array_path.display())))?;

        Ok(Self {
            sequence,
            suffix_array,
            step: config.step,
            stats: SortStats::default(),
        })
    }
}

/// Upper-case the reference, map `N` to `A`, and append one terminator per
/// period class when padding is enabled.
pub fn prepare_reference(reference: &[u8], config: &IndexConfig) -> Result<Vec<u8>, IndexError> {
    if reference.is_empty() {
        return Err(IndexError::EmptyReference);
    }
    let padding = if config.terminator_padding { config.step } else { 0 };
    let mut sequence = Vec::with_capacity(reference.len() + padding);
    for (position, &byte) in reference.iter().enumerate() {
        let base = match byte.to_ascii_uppercase() {
            b'N' => b'A',
            base @ (b'A' | b'C' | b'G' | b'T') => base,
            _ => {
                return Err(IndexError::UnsupportedCharacter {
                    ch: byte as char,
                    position,
                })
            }
        };
        sequence.push(base);
    }
    sequence.resize(reference.len() + padding, TERMINATOR_BYTE);
    Ok(sequence)
}

struct IndexMeta {
    length: usize,
    step: usize,
    checksum: String,
}

impl IndexMeta {
    fn parse(text: &str) -> Result<Self, IndexError> {
        let mut format = None;
        let mut length = None;
        let mut step = None;
        let mut checksum = None;
        for line in text.lines().filter(|l| !l.trim().is_empty()) {
            let (key, value) = line
                .split_once('=')
                .ok_or_else(|| IndexError::CorruptIndex(format!("bad metadata line '{line}'")))?;
            match key.trim() {
                "format" => format = Some(value.trim().to_string()),
                "length" => length = Some(parse_number(key, value)?),
                "step" => step = Some(parse_number(key, value)?),
                "checksum" => checksum = Some(value.trim().to_string()),
                _ => {}
            }
        }
        if format.as_deref() != Some(META_FORMAT) {
            return Err(IndexError::CorruptIndex("unknown metadata format".to_string()));
        }
        let missing = |field: &str| IndexError::CorruptIndex(format!("metadata missing {field}"));
        Ok(Self {
            length: length.ok_or_else(|| missing("length"))?,
            step: step.ok_or_else(|| missing("step"))?,
            checksum: checksum.ok_or_else(|| missing("checksum"))?,
        })
    }
}

fn parse_number(key: &str, value: &str) -> Result<usize, IndexError> {
    value
        .trim()
        .parse()
        .map_err(|_| IndexError::CorruptIndex(format!("invalid {key} '{}'", value.trim())))
}

fn suffixed(prefix: &Path, suffix: &str) -> PathBuf {
    let mut name: OsString = prefix.as_os_str().to_owned();
    name.push(suffix);
    PathBuf::from(name)
}
