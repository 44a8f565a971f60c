use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use tracing::{debug, trace};

use crate::engine::core::run::{Entry, RunReader};
use crate::engine::errors::RunError;

/// Buffers one batch of a run at a time and hands out its entries in order.
///
/// The cursor owns the run reader until the run reports end-of-data; the
/// reader is closed at that point and the cursor stays exhausted forever.
/// An empty buffered batch is never exposed: it is refilled first.
pub struct RunCursor {
    path: PathBuf,
    reader: Option<RunReader>,
    batch: VecDeque<Entry>,
}

/// Serializable position of a cursor: where the next frame starts plus the
/// unread tail of the batch already pulled from it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CursorCheckpoint {
    pub path: PathBuf,
    pub offset: u64,
    pub pending: Vec<Entry>,
    pub exhausted: bool,
}

impl RunCursor {
    /// Opens the run and loads its first batch.
    pub fn open(path: &Path) -> Result<Self, RunError> {
        let mut reader = RunReader::open(path)?;
        let first = reader.first_batch()?;
        let mut cursor = Self {
            path: path.to_path_buf(),
            reader: Some(reader),
            batch: VecDeque::new(),
        };
        match first {
            Some(batch) => cursor.batch.extend(batch),
            None => cursor.close_reader(),
        }
        Ok(cursor)
    }

    fn fill(&mut self) -> Result<(), RunError> {
        while self.batch.is_empty() {
            let Some(reader) = self.reader.as_mut() else {
                return Ok(());
            };
            match reader.next_batch()? {
                Some(batch) => self.batch.extend(batch),
                None => self.close_reader(),
            }
        }
        Ok(())
    }

    fn close_reader(&mut self) {
        if let Some(reader) = self.reader.take() {
            debug!(target: "run_cursor", path = %self.path.display(), "Run exhausted");
            reader.close();
        }
    }

    /// Current head entry without consuming it. `None` means the run is
    /// exhausted permanently.
    pub fn head(&mut self) -> Result<Option<&Entry>, RunError> {
        self.fill()?;
        Ok(self.batch.front())
    }

    /// Consumes and returns the next entry.
    pub fn next(&mut self) -> Result<Option<Entry>, RunError> {
        self.fill()?;
        let entry = self.batch.pop_front();
        if tracing::enabled!(tracing::Level::TRACE) {
            trace!(
                target: "run_cursor",
                path = %self.path.display(),
                key = ?entry.as_ref().map(|e| &e.key),
                buffered = self.batch.len(),
                "Advanced cursor"
            );
        }
        Ok(entry)
    }

    pub fn is_exhausted(&self) -> bool {
        self.reader.is_none() && self.batch.is_empty()
    }

    /// Releases the reader and captures the cursor position.
    pub fn checkpoint(mut self) -> CursorCheckpoint {
        let exhausted = self.reader.is_none();
        let offset = self.reader.as_ref().map(RunReader::position).unwrap_or(0);
        if let Some(reader) = self.reader.take() {
            reader.close();
        }
        CursorCheckpoint {
            path: self.path,
            offset,
            pending: self.batch.into_iter().collect(),
            exhausted,
        }
    }

    /// Rebuilds a cursor from a checkpoint, reopening the run at the saved
    /// frame offset unless it had already been exhausted.
    pub fn resume(checkpoint: CursorCheckpoint) -> Result<Self, RunError> {
        let reader = if checkpoint.exhausted {
            None
        } else {
            Some(RunReader::open_at(&checkpoint.path, checkpoint.offset)?)
        };
        Ok(Self {
            path: checkpoint.path,
            reader,
            batch: checkpoint.pending.into(),
        })
    }
}
