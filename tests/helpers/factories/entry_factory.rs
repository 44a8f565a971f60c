use crate::engine::core::{Entry, Value};

/// Big-endian encoding so byte order matches numeric order.
pub fn key(n: u32) -> Vec<u8> {
    n.to_be_bytes().to_vec()
}

pub struct EntryFactory {
    key: u32,
    value: Value,
}

impl EntryFactory {
    pub fn new() -> Self {
        Self {
            key: 1,
            value: Value::Put(b"value".to_vec()),
        }
    }

    pub fn with_key(mut self, key: u32) -> Self {
        self.key = key;
        self
    }

    pub fn with_value(mut self, value: &str) -> Self {
        self.value = Value::Put(value.as_bytes().to_vec());
        self
    }

    pub fn tombstone(mut self) -> Self {
        self.value = Value::Tombstone;
        self
    }

    pub fn create(self) -> Entry {
        Entry {
            key: key(self.key),
            value: self.value,
        }
    }

    /// `count` entries with keys `start, start + step, ...`, each value
    /// derived from its key so merges can be checked by content.
    pub fn create_list(self, start: u32, step: u32, count: usize) -> Vec<Entry> {
        (0..count as u32)
            .map(|i| {
                let k = start + i * step;
                let value = match &self.value {
                    Value::Tombstone => Value::Tombstone,
                    Value::Put(base) => {
                        let mut v = base.clone();
                        v.extend_from_slice(format!("-{k}").as_bytes());
                        Value::Put(v)
                    }
                };
                Entry { key: key(k), value }
            })
            .collect()
    }
}
