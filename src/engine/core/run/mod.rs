pub mod entry;
pub mod run_cursor;
pub mod run_reader;
pub mod run_writer;

pub use entry::{Batch, Entry, Value};
pub use run_cursor::{CursorCheckpoint, RunCursor};
pub use run_reader::{RunReader, read_run};
pub use run_writer::{RunWriter, RunWriterState};

#[cfg(test)]
mod run_writer_test;
