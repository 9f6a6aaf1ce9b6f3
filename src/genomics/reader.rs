use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::{Path, PathBuf};

use thiserror::Error;

/// Errors produced while reading FASTA/FASTQ input.
#[derive(Debug, Error)]
pub enum ReaderError {
    /// Underlying I/O failure.
    #[error("i/o error: {0}")]
    Io(#[from] io::Error),

    /// The input file could not be opened.
    #[error("failed to open {}: {source}", path.display())]
    Open {
        /// Path that was requested.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// Input did not follow the FASTA or FASTQ layout.
    #[error("malformed record at line {line}: {reason}")]
    MalformedRecord {
        /// 1-based line number where the problem was detected.
        line: usize,
        /// Description of the problem.
        reason: String,
    },
}

/// One named sequence from a FASTA or FASTQ stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SequenceRecord {
    /// Identifier: the header up to the first whitespace, without `>`/`@`.
    pub id: String,
    /// Raw sequence bytes with line breaks removed.
    pub sequence: Vec<u8>,
}

/// Line-oriented reader yielding [`SequenceRecord`]s.
///
/// Each record's layout is chosen by its first character: `>` starts a
/// (possibly multi-line) FASTA record, `@` starts a four-line FASTQ record.
#[derive(Debug)]
pub struct SequenceReader<R> {
    reader: R,
    line: String,
    line_no: usize,
    pending_header: Option<String>,
}

impl SequenceReader<BufReader<File>> {
    /// Open `path` for buffered reading.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ReaderError> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| ReaderError::Open {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self::new(BufReader::new(file)))
    }
}

impl<R: BufRead> SequenceReader<R> {
    /// Wrap a buffered reader.
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            line: String::new(),
            line_no: 0,
            pending_header: None,
        }
    }

    /// Read the next record, or `None` at end of input.
    pub fn read_record(&mut self) -> Result<Option<SequenceRecord>, ReaderError> {
        let header = match self.pending_header.take() {
            Some(header) => header,
            None => loop {
                if !self.next_line()? {
                    return Ok(None);
                }
                let trimmed = self.line.trim();
                if !trimmed.is_empty() {
                    break trimmed.to_string();
                }
            },
        };

        match header.as_bytes()[0] {
            b'>' => self.read_fasta(&header[1..]).map(Some),
            b'@' => self.read_fastq(&header[1..]).map(Some),
            _ => Err(self.malformed("expected '>' or '@' header")),
        }
    }

    fn read_fasta(&mut self, header: &str) -> Result<SequenceRecord, ReaderError> {
        let mut sequence = Vec::new();
        while self.next_line()? {
            let trimmed = self.line.trim();
            if trimmed.starts_with('>') || trimmed.starts_with('@') {
                self.pending_header = Some(trimmed.to_string());
                break;
            }
            sequence.extend_from_slice(trimmed.as_bytes());
        }
        Ok(SequenceRecord {
            id: record_id(header),
            sequence,
        })
    }

    fn read_fastq(&mut self, header: &str) -> Result<SequenceRecord, ReaderError> {
        if !self.next_line()? {
            return Err(self.malformed("missing sequence line"));
        }
        let sequence = self.line.trim().as_bytes().to_vec();

        if !self.next_line()? || !self.line.starts_with('+') {
            return Err(self.malformed("expected '+' separator"));
        }
        if !self.next_line()? {
            return Err(self.malformed("missing quality line"));
        }
        let quality_len = self.line.trim().len();
        if quality_len != sequence.len() {
            return Err(self.malformed(&format!(
                "quality length {} does not match sequence length {}",
                quality_len,
                sequence.len()
            )));
        }

        Ok(SequenceRecord {
            id: record_id(header),
            sequence,
        })
    }

    fn next_line(&mut self) -> Result<bool, ReaderError> {
        self.line.clear();
        let read = self.reader.read_line(&mut self.line)?;
        if read == 0 {
            return Ok(false);
        }
        self.line_no += 1;
        Ok(true)
    }

    fn malformed(&self, reason: &str) -> ReaderError {
        ReaderError::MalformedRecord {
            line: self.line_no,
            reason: reason.to_string(),
        }
    }
}

impl<R: BufRead> Iterator for SequenceReader<R> {
    type Item = Result<SequenceRecord, ReaderError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.read_record().transpose()
    }
}

fn record_id(header: &str) -> String {
    header.split_whitespace().next().unwrap_or("").to_string()
}
