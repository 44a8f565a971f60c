use crc32fast::Hasher as Crc32Hasher;
use std::fs::File;
use std::io::{BufReader, ErrorKind, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};
use tracing::{debug, trace};

use crate::engine::core::run::run_writer::{FRAME_HEADER_LEN, MAX_FRAME_LEN};
use crate::engine::core::run::{Batch, Entry};
use crate::engine::errors::RunError;
use crate::shared::storage_header::{BinaryHeader, FileKind, open_validated};

/// Sequential, forward-only reader over the batch frames of a run file.
pub struct RunReader {
    path: PathBuf,
    reader: BufReader<File>,
    /// Byte offset of the next unread frame.
    position: u64,
    trailer_count: Option<u64>,
}

impl RunReader {
    pub fn open(path: &Path) -> Result<Self, RunError> {
        let (file, _) = open_validated(path, FileKind::Run).map_err(|source| RunError::Open {
            path: path.to_path_buf(),
            source,
        })?;
        debug!(target: "run_reader::open", path = %path.display(), "Opened run");
        Ok(Self {
            path: path.to_path_buf(),
            reader: BufReader::new(file),
            position: BinaryHeader::TOTAL_LEN as u64,
            trailer_count: None,
        })
    }

    /// Opens a run and positions it at `offset`, which must be a frame
    /// boundary previously reported by `position()`.
    pub fn open_at(path: &Path, offset: u64) -> Result<Self, RunError> {
        let mut run = Self::open(path)?;
        if offset < BinaryHeader::TOTAL_LEN as u64 {
            return Err(RunError::Corrupt(format!(
                "resume offset {offset} inside header of {}",
                path.display()
            )));
        }
        run.reader.seek(SeekFrom::Start(offset))?;
        run.position = offset;
        Ok(run)
    }

    /// Rewinds to the first frame and reads it.
    pub fn first_batch(&mut self) -> Result<Option<Batch>, RunError> {
        let start = BinaryHeader::TOTAL_LEN as u64;
        self.reader.seek(SeekFrom::Start(start))?;
        self.position = start;
        self.trailer_count = None;
        self.next_batch()
    }

    /// Returns the next batch, or `None` once the trailer is reached.
    pub fn next_batch(&mut self) -> Result<Option<Batch>, RunError> {
        if self.trailer_count.is_some() {
            return Ok(None);
        }

        let mut frame = [0u8; FRAME_HEADER_LEN];
        if let Err(e) = self.reader.read_exact(&mut frame) {
            return Err(self.truncated(e));
        }
        let len = u32::from_le_bytes([frame[0], frame[1], frame[2], frame[3]]);
        let crc = u32::from_le_bytes([frame[4], frame[5], frame[6], frame[7]]);

        if len == 0 {
            let mut count = [0u8; 8];
            if let Err(e) = self.reader.read_exact(&mut count) {
                return Err(self.truncated(e));
            }
            let count = u64::from_le_bytes(count);
            self.trailer_count = Some(count);
            debug!(target: "run_reader::next_batch", path = %self.path.display(), entries = count, "Reached run trailer");
            return Ok(None);
        }
        if len as usize > MAX_FRAME_LEN {
            return Err(RunError::Corrupt(format!(
                "frame of {len} bytes at offset {} in {}",
                self.position,
                self.path.display()
            )));
        }

        let mut payload = vec![0u8; len as usize];
        if let Err(e) = self.reader.read_exact(&mut payload) {
            return Err(self.truncated(e));
        }
        let mut hasher = Crc32Hasher::new();
        hasher.update(&payload);
        if hasher.finalize() != crc {
            return Err(RunError::Corrupt(format!(
                "frame crc mismatch at offset {} in {}",
                self.position,
                self.path.display()
            )));
        }

        let batch: Vec<Entry> = bincode::deserialize(&payload)?;
        self.position += (FRAME_HEADER_LEN + payload.len()) as u64;

        if tracing::enabled!(tracing::Level::TRACE) {
            trace!(target: "run_reader::next_batch", path = %self.path.display(), entries = batch.len(), position = self.position, "Read batch");
        }
        Ok(Some(batch))
    }

    fn truncated(&self, e: std::io::Error) -> RunError {
        if e.kind() == ErrorKind::UnexpectedEof {
            RunError::Corrupt(format!(
                "{} ends at offset {} without a trailer",
                self.path.display(),
                self.position
            ))
        } else {
            RunError::Io(e)
        }
    }

    pub fn position(&self) -> u64 {
        self.position
    }

    /// Entry count recorded in the trailer, once it has been read.
    pub fn entry_count(&self) -> Option<u64> {
        self.trailer_count
    }

    pub fn close(self) {
        debug!(target: "run_reader::close", path = %self.path.display(), position = self.position, "Closed run");
    }
}

/// Reads every entry of a finished run.
pub fn read_run(path: &Path) -> Result<Vec<Entry>, RunError> {
    let mut reader = RunReader::open(path)?;
    let mut entries = Vec::new();
    let mut next = reader.first_batch()?;
    while let Some(batch) = next {
        entries.extend(batch);
        next = reader.next_batch()?;
    }
    reader.close();
    Ok(entries)
}
