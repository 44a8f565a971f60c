use crate::engine::errors::SnapshotError;

use lz4_flex::block::{
    compress_prepend_size as lz4_compress, decompress_size_prepended as lz4_decompress,
};

pub const ALGO_LZ4: u16 = 0x0001;

/// Block codec applied to hibernation snapshots. The algorithm id is stored
/// in the snapshot header flags so a reader can refuse unknown encodings.
pub trait CompressionCodec {
    fn algo_id(&self) -> u16;
    fn compress(&self, input: &[u8]) -> Vec<u8>;
    fn decompress(&self, input: &[u8]) -> Result<Vec<u8>, SnapshotError>;
}

pub struct Lz4Codec;

impl CompressionCodec for Lz4Codec {
    fn algo_id(&self) -> u16 {
        ALGO_LZ4
    }
    fn compress(&self, input: &[u8]) -> Vec<u8> {
        lz4_compress(input)
    }
    fn decompress(&self, input: &[u8]) -> Result<Vec<u8>, SnapshotError> {
        lz4_decompress(input).map_err(|e| SnapshotError::Decompress(format!("lz4: {e}")))
    }
}
