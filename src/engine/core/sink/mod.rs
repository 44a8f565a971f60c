pub mod embedded_sink;
pub mod isolated_sink;

pub use embedded_sink::EmbeddedSink;
pub use isolated_sink::IsolatedSink;

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::engine::core::run::{Entry, RunWriterState};
use crate::engine::errors::SinkError;

#[cfg(test)]
mod embedded_sink_test;
#[cfg(test)]
mod isolated_sink_test;

/// Where the output writer runs relative to the merge scanner.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SinkMode {
    /// Same thread as the scanner; appends are direct calls.
    #[default]
    Embedded,
    /// Dedicated worker thread; every append is a request/response exchange.
    Isolated,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SinkOptions {
    /// Expected number of output entries (sum of both inputs).
    pub target_size: u64,
    pub batch_bytes: usize,
    pub last_level: bool,
}

/// Portable form of a suspended sink.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SinkState {
    pub options: SinkOptions,
    pub writer: RunWriterState,
    pub written: u64,
}

/// Ordered, append-only destination of a merge.
pub trait OutputSink: Send {
    fn mode(&self) -> SinkMode;

    fn append(&mut self, entry: Entry) -> Result<(), SinkError>;

    /// Entries appended so far.
    fn written(&self) -> u64;

    /// Releases the sink's resources and returns its serialized state.
    fn suspend(self: Box<Self>) -> Result<Vec<u8>, SinkError>;

    /// Completes the output run and returns the number of entries written.
    fn finalize(self: Box<Self>) -> Result<u64, SinkError>;
}

pub fn create_sink(
    path: &Path,
    options: &SinkOptions,
    mode: SinkMode,
) -> Result<Box<dyn OutputSink>, SinkError> {
    let sink = EmbeddedSink::create(path, options.clone())?;
    wrap(sink, mode)
}

pub fn restore_sink(bytes: &[u8], mode: SinkMode) -> Result<Box<dyn OutputSink>, SinkError> {
    let sink = EmbeddedSink::from_bytes(bytes)?;
    wrap(sink, mode)
}

fn wrap(sink: EmbeddedSink, mode: SinkMode) -> Result<Box<dyn OutputSink>, SinkError> {
    match mode {
        SinkMode::Embedded => Ok(Box::new(sink)),
        SinkMode::Isolated => Ok(Box::new(IsolatedSink::spawn(sink)?)),
    }
}
