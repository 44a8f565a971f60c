use serde::{Deserialize, Serialize};

/// Stored value of a key. `Tombstone` marks a logical delete and is carried
/// through merges until the last level drops it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Value {
    Put(Vec<u8>),
    Tombstone,
}

impl Value {
    pub fn is_tombstone(&self) -> bool {
        matches!(self, Value::Tombstone)
    }

    pub fn encoded_len(&self) -> usize {
        match self {
            Value::Put(bytes) => bytes.len(),
            Value::Tombstone => 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    pub key: Vec<u8>,
    pub value: Value,
}

impl Entry {
    pub fn put(key: impl Into<Vec<u8>>, value: impl Into<Vec<u8>>) -> Self {
        Self {
            key: key.into(),
            value: Value::Put(value.into()),
        }
    }

    pub fn tombstone(key: impl Into<Vec<u8>>) -> Self {
        Self {
            key: key.into(),
            value: Value::Tombstone,
        }
    }

    pub fn is_tombstone(&self) -> bool {
        self.value.is_tombstone()
    }

    /// Rough on-disk footprint, used to decide when a batch is full.
    pub fn approx_size(&self) -> usize {
        self.key.len() + self.value.encoded_len() + 16
    }
}

/// One frame worth of entries, in strictly increasing key order.
pub type Batch = Vec<Entry>;
