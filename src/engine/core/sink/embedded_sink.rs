use std::path::Path;
use tracing::{debug, info};

use crate::engine::core::run::{Entry, RunWriter};
use crate::engine::core::sink::{OutputSink, SinkMode, SinkOptions, SinkState};
use crate::engine::errors::{RunError, SinkError};

/// Output sink that writes the run directly from the calling thread.
pub struct EmbeddedSink {
    options: SinkOptions,
    writer: RunWriter,
    written: u64,
}

impl EmbeddedSink {
    pub fn create(path: &Path, options: SinkOptions) -> Result<Self, SinkError> {
        let writer = RunWriter::create(path, options.batch_bytes).map_err(|e| match e {
            RunError::Open { path, source } => SinkError::Create { path, source },
            other => SinkError::Run(other),
        })?;
        info!(
            target: "sink::embedded",
            path = %path.display(),
            target_size = options.target_size,
            last_level = options.last_level,
            "Created output sink"
        );
        Ok(Self {
            options,
            writer,
            written: 0,
        })
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, SinkError> {
        let state: SinkState = bincode::deserialize(bytes)?;
        let writer = RunWriter::resume(state.writer)?;
        debug!(target: "sink::embedded", path = %writer.path().display(), written = state.written, "Restored output sink");
        Ok(Self {
            options: state.options,
            writer,
            written: state.written,
        })
    }

    pub fn append_entry(&mut self, entry: Entry) -> Result<(), SinkError> {
        self.writer.add(entry)?;
        self.written += 1;
        Ok(())
    }

    pub fn written_count(&self) -> u64 {
        self.written
    }

    pub fn into_bytes(self) -> Result<Vec<u8>, SinkError> {
        let state = SinkState {
            options: self.options,
            writer: self.writer.suspend()?,
            written: self.written,
        };
        Ok(bincode::serialize(&state)?)
    }

    pub fn finish(self) -> Result<u64, SinkError> {
        let count = self.writer.finish()?;
        debug_assert_eq!(count, self.written);
        Ok(self.written)
    }
}

impl OutputSink for EmbeddedSink {
    fn mode(&self) -> SinkMode {
        SinkMode::Embedded
    }

    fn append(&mut self, entry: Entry) -> Result<(), SinkError> {
        self.append_entry(entry)
    }

    fn written(&self) -> u64 {
        self.written
    }

    fn suspend(self: Box<Self>) -> Result<Vec<u8>, SinkError> {
        (*self).into_bytes()
    }

    fn finalize(self: Box<Self>) -> Result<u64, SinkError> {
        (*self).finish()
    }
}
