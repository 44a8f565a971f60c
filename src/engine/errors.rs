use std::io;
use std::path::PathBuf;
use thiserror::Error;
use tracing::{debug, error};

/// Errors raised while reading or writing run files.
#[derive(Debug, Error)]
pub enum RunError {
    #[error("Failed to open run {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Corrupt run: {0}")]
    Corrupt(String),

    #[error("Batch encoding failed: {0}")]
    Codec(#[from] bincode::Error),

    #[error("Keys out of order: {0}")]
    OutOfOrder(String),

    #[error("Frame too large: {0}")]
    Oversized(String),
}

#[derive(Debug, Error)]
pub enum SinkError {
    #[error("Failed to create output {path}: {source}")]
    Create {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Run write failed: {0}")]
    Run(#[from] RunError),

    #[error("Sink state encoding failed: {0}")]
    State(#[from] bincode::Error),

    #[error("Sink worker is gone")]
    WorkerGone,
}

#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("Snapshot header invalid: {0}")]
    Header(#[from] io::Error),

    #[error("Snapshot decompression failed: {0}")]
    Decompress(String),

    #[error("Snapshot encode/decode failed: {0}")]
    Codec(#[from] bincode::Error),
}

#[derive(Debug, Error)]
pub enum MergeError {
    #[error("Failed to open input run: {0}")]
    Open(RunError),

    #[error("Run read failed: {0}")]
    Run(#[from] RunError),

    #[error("Output sink failed: {0}")]
    Sink(#[from] SinkError),

    #[error("Hibernation snapshot unusable: {0}")]
    Snapshot(#[from] SnapshotError),

    #[error("Merge task failed: {0}")]
    Task(String),

    #[error("Merge abandoned before completion")]
    Abandoned,

    #[error("Merge is no longer accepting steps")]
    Closed,
}

impl MergeError {
    pub fn log_error(&self) {
        match self {
            MergeError::Open(e) => {
                error!("Failed to open input run: {}", e);
                debug!("Open error details: {:?}", e);
            }
            MergeError::Run(e) => {
                error!("Run read failed: {}", e);
                debug!("Run read error details: {:?}", e);
            }
            MergeError::Sink(e) => {
                error!("Output sink failed: {}", e);
                debug!("Output sink error details: {:?}", e);
            }
            MergeError::Snapshot(e) => {
                error!("Hibernation snapshot unusable: {}", e);
                debug!("Snapshot error details: {:?}", e);
            }
            MergeError::Task(e) => {
                error!("Merge task failed: {}", e);
            }
            MergeError::Abandoned => {
                error!("Merge abandoned");
                debug!("All step handles were dropped before the merge completed");
            }
            MergeError::Closed => {
                error!("Merge is closed");
            }
        }
    }
}
