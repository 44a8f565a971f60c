use crate::engine::core::{Entry, RunWriter, Value};
use crate::test_helpers::factories::key;
use std::path::{Path, PathBuf};

pub struct RunFactory {
    dir: PathBuf,
    entries: Vec<Entry>,
    batch_bytes: usize,
}

impl RunFactory {
    pub fn new(dir: &Path) -> Self {
        Self {
            dir: dir.to_path_buf(),
            entries: Vec::new(),
            batch_bytes: 64,
        }
    }

    pub fn with_entries(mut self, entries: Vec<Entry>) -> Self {
        self.entries = entries;
        self
    }

    /// `(key, Some(value))` is a put, `(key, None)` a tombstone.
    pub fn with_pairs(mut self, pairs: &[(u32, Option<&str>)]) -> Self {
        self.entries = pairs
            .iter()
            .map(|(k, v)| Entry {
                key: key(*k),
                value: match v {
                    Some(v) => Value::Put(v.as_bytes().to_vec()),
                    None => Value::Tombstone,
                },
            })
            .collect();
        self
    }

    pub fn with_batch_bytes(mut self, batch_bytes: usize) -> Self {
        self.batch_bytes = batch_bytes;
        self
    }

    pub fn create(self, name: &str) -> PathBuf {
        let path = self.dir.join(name);
        let mut writer = RunWriter::create(&path, self.batch_bytes).unwrap();
        for entry in self.entries {
            writer.add(entry).unwrap();
        }
        writer.finish().unwrap();
        path
    }
}
