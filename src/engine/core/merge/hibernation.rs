use serde::{Deserialize, Serialize};
use std::io::Cursor;
use tracing::info;

use crate::engine::core::compression::{CompressionCodec, Lz4Codec};
use crate::engine::core::merge::{MergePhase, MergeScanner};
use crate::engine::core::run::{CursorCheckpoint, RunCursor};
use crate::engine::core::sink::{SinkMode, restore_sink};
use crate::engine::errors::{MergeError, SnapshotError};
use crate::shared::storage_header::{BinaryHeader, FileKind};

const LOG_TARGET: &str = "merge::hibernation";

/// Complete live state of a paused merge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergeSnapshot {
    pub cursor_a: CursorCheckpoint,
    pub cursor_b: CursorCheckpoint,
    pub sink_mode: SinkMode,
    pub sink: Vec<u8>,
    pub last_level: bool,
    pub phase: MergePhase,
    pub written: u64,
    pub actions: u64,
}

impl MergeScanner {
    /// Releases every open handle and captures the state needed to resume.
    pub fn into_snapshot(self) -> Result<MergeSnapshot, MergeError> {
        let sink = self.sink.ok_or(MergeError::Closed)?;
        let sink_mode = sink.mode();
        let sink = sink.suspend()?;
        Ok(MergeSnapshot {
            cursor_a: self.cursor_a.checkpoint(),
            cursor_b: self.cursor_b.checkpoint(),
            sink_mode,
            sink,
            last_level: self.last_level,
            phase: self.phase,
            written: self.written,
            actions: self.actions,
        })
    }

    pub fn from_snapshot(snapshot: MergeSnapshot) -> Result<Self, MergeError> {
        let cursor_a = RunCursor::resume(snapshot.cursor_a)?;
        let cursor_b = RunCursor::resume(snapshot.cursor_b)?;
        let sink = restore_sink(&snapshot.sink, snapshot.sink_mode)?;
        Ok(Self {
            cursor_a,
            cursor_b,
            sink: Some(sink),
            last_level: snapshot.last_level,
            phase: snapshot.phase,
            written: snapshot.written,
            actions: snapshot.actions,
        })
    }
}

/// A merge reduced to one compressed buffer.
/// Format:
///   [BinaryHeader, flags = codec id]
///   lz4(size-prepended, bincode(MergeSnapshot))
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HibernatedMerge {
    bytes: Vec<u8>,
}

impl HibernatedMerge {
    pub fn capture(scanner: MergeScanner) -> Result<Self, MergeError> {
        let snapshot = scanner.into_snapshot()?;
        let hibernated = Self::encode(&snapshot)?;
        info!(
            target: LOG_TARGET,
            phase = ?snapshot.phase,
            written = snapshot.written,
            bytes = hibernated.len(),
            "Merge hibernated"
        );
        Ok(hibernated)
    }

    pub fn restore(self) -> Result<MergeScanner, MergeError> {
        let snapshot = self.decode()?;
        info!(target: LOG_TARGET, phase = ?snapshot.phase, written = snapshot.written, "Merge resuming");
        MergeScanner::from_snapshot(snapshot)
    }

    pub fn encode(snapshot: &MergeSnapshot) -> Result<Self, SnapshotError> {
        let codec = Lz4Codec;
        let raw = bincode::serialize(snapshot)?;
        let header = FileKind::MergeSnapshot.header(codec.algo_id());

        let packed = codec.compress(&raw);
        let mut bytes = Vec::with_capacity(BinaryHeader::TOTAL_LEN + packed.len());
        bytes.extend_from_slice(&header.to_bytes());
        bytes.extend_from_slice(&packed);
        Ok(Self { bytes })
    }

    pub fn decode(&self) -> Result<MergeSnapshot, SnapshotError> {
        let codec = Lz4Codec;
        let header = BinaryHeader::read_from(Cursor::new(&self.bytes))?;
        FileKind::MergeSnapshot.validate(&header)?;
        if header.flags != codec.algo_id() {
            return Err(SnapshotError::Decompress(format!(
                "unknown codec id {}",
                header.flags
            )));
        }
        let raw = codec.decompress(&self.bytes[BinaryHeader::TOTAL_LEN..])?;
        Ok(bincode::deserialize(&raw)?)
    }

    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Self { bytes }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}
