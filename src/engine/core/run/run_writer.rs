use crc32fast::Hasher as Crc32Hasher;
use serde::{Deserialize, Serialize};
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::engine::core::run::Entry;
use crate::engine::errors::RunError;
use crate::shared::storage_header::{BinaryHeader, FileKind};

/// Size of a frame header: u32 payload length + u32 payload crc32.
pub const FRAME_HEADER_LEN: usize = 8;

/// Largest frame payload a reader accepts.
pub const MAX_FRAME_LEN: usize = 64 * 1024 * 1024;

/// Cap on `batch_bytes` and on a single entry's size. Two of them plus the
/// bincode framing overhead still fit in one frame.
pub const MAX_BATCH_BYTES: usize = MAX_FRAME_LEN / 4;

/// Writer for run files.
/// Format:
///   [BinaryHeader]
///   repeated { u32 len, u32 crc32, [len bytes of bincode(Vec<Entry>)] }
///   trailer  { u32 0, u32 0, u64 entry_count }
pub struct RunWriter {
    path: PathBuf,
    writer: BufWriter<File>,
    pending: Vec<Entry>,
    pending_bytes: usize,
    batch_bytes: usize,
    /// Bytes handed to `writer` so far (header plus complete frames).
    file_len: u64,
    entry_count: u64,
    last_key: Option<Vec<u8>>,
}

/// Everything needed to reopen a partially written run and keep appending.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunWriterState {
    pub path: PathBuf,
    pub batch_bytes: usize,
    pub file_len: u64,
    pub pending: Vec<Entry>,
    pub entry_count: u64,
    pub last_key: Option<Vec<u8>>,
}

impl RunWriter {
    pub fn create(path: &Path, batch_bytes: usize) -> Result<Self, RunError> {
        let file = File::create(path).map_err(|source| RunError::Open {
            path: path.to_path_buf(),
            source,
        })?;
        let mut writer = BufWriter::new(file);
        FileKind::Run.header(0).write_to(&mut writer)?;

        debug!(target: "run_writer::create", path = %path.display(), batch_bytes, "Created run file");

        Ok(Self {
            path: path.to_path_buf(),
            writer,
            pending: Vec::new(),
            pending_bytes: 0,
            batch_bytes: batch_bytes.clamp(1, MAX_BATCH_BYTES),
            file_len: BinaryHeader::TOTAL_LEN as u64,
            entry_count: 0,
            last_key: None,
        })
    }

    /// Appends one entry. Keys must be strictly increasing and no entry may
    /// exceed `MAX_BATCH_BYTES`.
    pub fn add(&mut self, entry: Entry) -> Result<(), RunError> {
        let size = entry.approx_size();
        if size > MAX_BATCH_BYTES {
            return Err(RunError::Oversized(format!(
                "entry of {size} bytes exceeds {MAX_BATCH_BYTES} in {}",
                self.path.display()
            )));
        }
        if let Some(last) = &self.last_key {
            if entry.key <= *last {
                return Err(RunError::OutOfOrder(format!(
                    "{:?} after {:?} in {}",
                    entry.key,
                    last,
                    self.path.display()
                )));
            }
        }

        self.last_key = Some(entry.key.clone());
        self.pending_bytes += size;
        self.pending.push(entry);
        self.entry_count += 1;

        if self.pending_bytes >= self.batch_bytes {
            self.flush_batch()?;
        }
        Ok(())
    }

    fn flush_batch(&mut self) -> Result<(), RunError> {
        if self.pending.is_empty() {
            return Ok(());
        }

        let payload = bincode::serialize(&self.pending)?;
        if payload.len() > MAX_FRAME_LEN {
            return Err(RunError::Oversized(format!(
                "batch of {} bytes exceeds frame limit in {}",
                payload.len(),
                self.path.display()
            )));
        }
        let mut hasher = Crc32Hasher::new();
        hasher.update(&payload);
        let crc = hasher.finalize();

        self.writer.write_all(&(payload.len() as u32).to_le_bytes())?;
        self.writer.write_all(&crc.to_le_bytes())?;
        self.writer.write_all(&payload)?;
        self.file_len += (FRAME_HEADER_LEN + payload.len()) as u64;

        debug!(target: "run_writer::flush_batch", entries = self.pending.len(), bytes = payload.len(), "Wrote batch frame");

        self.pending.clear();
        self.pending_bytes = 0;
        Ok(())
    }

    /// Flushes the last batch, writes the trailer and fsyncs.
    pub fn finish(mut self) -> Result<u64, RunError> {
        self.flush_batch()?;

        self.writer.write_all(&0u32.to_le_bytes())?;
        self.writer.write_all(&0u32.to_le_bytes())?;
        self.writer.write_all(&self.entry_count.to_le_bytes())?;
        self.writer.flush()?;
        self.writer.get_ref().sync_all()?;

        info!(target: "run_writer::finish", path = %self.path.display(), entries = self.entry_count, "Finished run");
        Ok(self.entry_count)
    }

    /// Flushes complete frames to disk and releases the file handle. The
    /// still-open batch travels in the returned state.
    pub fn suspend(mut self) -> Result<RunWriterState, RunError> {
        self.writer.flush()?;
        Ok(RunWriterState {
            path: self.path,
            batch_bytes: self.batch_bytes,
            file_len: self.file_len,
            pending: self.pending,
            entry_count: self.entry_count,
            last_key: self.last_key,
        })
    }

    /// Reopens a suspended run. Anything past `file_len` is discarded.
    pub fn resume(state: RunWriterState) -> Result<Self, RunError> {
        let mut file = OpenOptions::new()
            .write(true)
            .open(&state.path)
            .map_err(|source| RunError::Open {
                path: state.path.clone(),
                source,
            })?;
        file.set_len(state.file_len)?;
        file.seek(SeekFrom::Start(state.file_len))?;

        let pending_bytes = state.pending.iter().map(Entry::approx_size).sum();
        Ok(Self {
            path: state.path,
            writer: BufWriter::new(file),
            pending: state.pending,
            pending_bytes,
            batch_bytes: state.batch_bytes.clamp(1, MAX_BATCH_BYTES),
            file_len: state.file_len,
            entry_count: state.entry_count,
            last_key: state.last_key,
        })
    }

    pub fn entry_count(&self) -> u64 {
        self.entry_count
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}
