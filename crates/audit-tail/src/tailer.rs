//! Offset-tracking reader for append-only JSON-lines files.
//!
//! This module provides:
//! - [`LogTailer`] — Reads complete records appended since the last poll
//! - [`TailerConfig`] — Read buffer sizing
//! - [`Disposition`] — Visitor answer controlling offset advancement
//!
//! A record is one newline-terminated line that starts with `{` and ends with
//! `}`. The offset only moves past a record once the visitor consumed it, so a
//! failing or deferring visitor causes the same record to be re-read on the
//! next poll.

use std::fs::{self, File};
use std::io::{self, BufRead, BufReader, Seek, SeekFrom};
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::error::{Result, TailError};

/// Default read buffer: large enough for audit entries carrying full bodies.
pub const DEFAULT_READ_BUFFER_SIZE: usize = 4 * 1024 * 1024;

/// Smallest read buffer accepted by [`TailerConfig::with_read_buffer_size`].
pub const MIN_READ_BUFFER_SIZE: usize = 64 * 1024;

/// Bytes of a corrupt record kept for the error message.
const PREVIEW_LEN: usize = 64;

/// Configuration for a [`LogTailer`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TailerConfig {
    /// Capacity of the buffered reader in bytes.
    pub read_buffer_size: usize,
}

impl Default for TailerConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl TailerConfig {
    /// Creates a config with default values.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            read_buffer_size: DEFAULT_READ_BUFFER_SIZE,
        }
    }

    /// Sets the read buffer size, clamped to [`MIN_READ_BUFFER_SIZE`].
    #[must_use]
    pub fn with_read_buffer_size(mut self, size: usize) -> Self {
        self.read_buffer_size = size.max(MIN_READ_BUFFER_SIZE);
        self
    }
}

/// What the poll visitor did with a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    /// The record was processed; advance past it.
    Consumed,
    /// Stop this poll without consuming the record.
    Deferred,
}

/// Outcome of one poll.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PollSummary {
    /// Records consumed.
    pub records: usize,
    /// Bytes the offset advanced by, including newlines and skipped NULs.
    pub bytes: u64,
    /// The file shrank below the stored offset and reading restarted at 0.
    pub truncated: bool,
    /// The visitor deferred a record.
    pub deferred: bool,
}

/// Tails one append-only file by byte offset.
#[derive(Debug, Clone)]
pub struct LogTailer {
    path: PathBuf,
    offset: u64,
    config: TailerConfig,
}

impl LogTailer {
    /// Creates a tailer starting at offset 0.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self::with_config(path, TailerConfig::default())
    }

    /// Creates a tailer with an explicit configuration.
    #[must_use]
    pub fn with_config(path: impl Into<PathBuf>, config: TailerConfig) -> Self {
        Self {
            path: path.into(),
            offset: 0,
            config,
        }
    }

    /// Returns the tailed path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns the offset of the first unconsumed byte.
    #[must_use]
    pub const fn offset(&self) -> u64 {
        self.offset
    }

    /// Reads records appended since the last poll and hands each to `visit`.
    ///
    /// Stops cleanly at an unterminated trailing record. A terminated line
    /// that is not a JSON object aborts the poll with
    /// [`TailError::Corrupt`]; an error from `visit` aborts the poll with
    /// that error. In both cases the offset stays at the start of the
    /// offending record.
    ///
    /// # Errors
    ///
    /// Returns [`TailError::Io`] if the file cannot be stat'ed, opened, seeked
    /// or read, [`TailError::Corrupt`] for a malformed line, or the visitor's
    /// error.
    pub fn poll<E, F>(&mut self, mut visit: F) -> std::result::Result<PollSummary, E>
    where
        E: From<TailError>,
        F: FnMut(&[u8]) -> std::result::Result<Disposition, E>,
    {
        let mut summary = PollSummary::default();

        let size = fs::metadata(&self.path)
            .map_err(|e| TailError::io(&self.path, e))?
            .len();

        if size < self.offset {
            info!(
                path = %self.path.display(),
                offset = self.offset,
                size,
                "log shrank below offset, rereading from start"
            );
            self.offset = 0;
            summary.truncated = true;
        }

        if size == self.offset {
            return Ok(summary);
        }

        let mut file = File::open(&self.path).map_err(|e| TailError::io(&self.path, e))?;
        file.seek(SeekFrom::Start(self.offset))
            .map_err(|e| TailError::io(&self.path, e))?;
        let mut reader = BufReader::with_capacity(self.config.read_buffer_size, file);
        let mut line = Vec::new();

        loop {
            let nuls = skip_nuls(&mut reader).map_err(|e| TailError::io(&self.path, e))?;

            line.clear();
            let read = reader
                .read_until(b'\n', &mut line)
                .map_err(|e| TailError::io(&self.path, e))?;
            if read == 0 {
                break;
            }
            if line.last() != Some(&b'\n') {
                debug!(
                    path = %self.path.display(),
                    offset = self.offset,
                    pending = read,
                    "partial record at end of file"
                );
                break;
            }

            let record = &line[..line.len() - 1];
            if !is_well_formed(record) {
                return Err(TailError::Corrupt {
                    offset: self.offset + nuls,
                    preview: preview(record),
                }
                .into());
            }

            match visit(record)? {
                Disposition::Consumed => {
                    let consumed = nuls + line.len() as u64;
                    self.offset += consumed;
                    summary.records += 1;
                    summary.bytes += consumed;
                }
                Disposition::Deferred => {
                    summary.deferred = true;
                    break;
                }
            }
        }

        Ok(summary)
    }

    /// Reads and consumes every complete record appended since the last poll.
    ///
    /// # Errors
    ///
    /// Same as [`LogTailer::poll`].
    pub fn poll_records(&mut self) -> Result<Vec<Vec<u8>>> {
        let mut records = Vec::new();
        self.poll(|record| {
            records.push(record.to_vec());
            Ok::<_, TailError>(Disposition::Consumed)
        })?;
        Ok(records)
    }
}

/// Skips a run of NUL bytes (pre-allocated regions) and returns its length.
fn skip_nuls<R: BufRead>(reader: &mut R) -> io::Result<u64> {
    let mut skipped = 0u64;
    loop {
        let buf = reader.fill_buf()?;
        let available = buf.len();
        if available == 0 {
            return Ok(skipped);
        }
        let nuls = buf.iter().take_while(|&&b| b == 0).count();
        reader.consume(nuls);
        skipped += nuls as u64;
        if nuls < available {
            return Ok(skipped);
        }
    }
}

fn is_well_formed(record: &[u8]) -> bool {
    record.first() == Some(&b'{') && record.last() == Some(&b'}')
}

fn preview(record: &[u8]) -> String {
    String::from_utf8_lossy(&record[..record.len().min(PREVIEW_LEN)]).into_owned()
}
