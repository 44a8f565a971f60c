pub mod compression;
pub mod merge;
pub mod run;
pub mod sink;

pub use compression::{CompressionCodec, Lz4Codec};
pub use merge::{
    BurstOutcome, HibernatedMerge, MergeHandle, MergeInputs, MergeOptions, MergePhase,
    MergeScanner, MergeSnapshot, StepBudget, StepDone, StepStatus, StepToken, merge, spawn_merge,
};
pub use run::{Batch, CursorCheckpoint, Entry, RunCursor, RunReader, RunWriter, Value, read_run};
pub use sink::{EmbeddedSink, IsolatedSink, OutputSink, SinkMode, SinkOptions};
