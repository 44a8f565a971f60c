use std::path::PathBuf;
use std::time::Duration;

use crate::engine::core::sink::SinkMode;
use crate::shared::config::MergeConfig;

/// The two input runs and the output of one merge. `run_b` is the newer run
/// and wins on equal keys.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeInputs {
    pub run_a: PathBuf,
    pub run_b: PathBuf,
    pub output: PathBuf,
    pub target_size: u64,
    pub last_level: bool,
}

impl MergeInputs {
    pub fn new(
        run_a: impl Into<PathBuf>,
        run_b: impl Into<PathBuf>,
        output: impl Into<PathBuf>,
    ) -> Self {
        Self {
            run_a: run_a.into(),
            run_b: run_b.into(),
            output: output.into(),
            target_size: 0,
            last_level: false,
        }
    }

    pub fn with_last_level(mut self, last_level: bool) -> Self {
        self.last_level = last_level;
        self
    }

    pub fn with_target_size(mut self, target_size: u64) -> Self {
        self.target_size = target_size;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeOptions {
    pub batch_bytes: usize,
    pub sink_mode: SinkMode,
    pub idle_hibernate: Duration,
}

impl MergeOptions {
    pub fn from_config(cfg: &MergeConfig) -> Self {
        Self {
            batch_bytes: cfg.batch_bytes,
            sink_mode: cfg.sink_mode,
            idle_hibernate: Duration::from_millis(cfg.idle_hibernate_ms),
        }
    }

    pub fn with_batch_bytes(mut self, batch_bytes: usize) -> Self {
        self.batch_bytes = batch_bytes;
        self
    }

    pub fn with_sink_mode(mut self, sink_mode: SinkMode) -> Self {
        self.sink_mode = sink_mode;
        self
    }

    pub fn with_idle_hibernate(mut self, idle: Duration) -> Self {
        self.idle_hibernate = idle;
        self
    }
}

impl Default for MergeOptions {
    fn default() -> Self {
        Self::from_config(&MergeConfig::default())
    }
}
