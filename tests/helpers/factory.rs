pub use super::factories::{EntryFactory, RunFactory, key};
use std::path::Path;

pub struct Factory;

impl Factory {
    pub fn entry() -> EntryFactory {
        EntryFactory::new()
    }

    pub fn run(dir: &Path) -> RunFactory {
        RunFactory::new(dir)
    }
}
