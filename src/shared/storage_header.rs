use crc32fast::Hasher as Crc32Hasher;
use std::fs::File;
use std::io::{self, ErrorKind, Read, Write};
use std::path::Path;

/// On-disk layout version shared by runs and snapshots.
pub const FORMAT_VERSION: u16 = 1;

/// Fixed 20-byte prefix of every run file and every hibernation snapshot:
///   magic[8] | version u16 | flags u16 | reserved u32 | crc32 u32
/// All integers are little-endian; the crc covers the first 16 bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BinaryHeader {
    pub magic: [u8; 8],
    pub version: u16,
    pub flags: u16,
    pub reserved: u32,
    pub header_crc32: u32,
}

impl BinaryHeader {
    pub const LEN_WITHOUT_CRC: usize = 16;
    pub const TOTAL_LEN: usize = Self::LEN_WITHOUT_CRC + 4;

    pub fn new(magic: [u8; 8], version: u16, flags: u16) -> Self {
        let mut header = Self {
            magic,
            version,
            flags,
            reserved: 0,
            header_crc32: 0,
        };
        header.header_crc32 = crc_of(&header.body());
        header
    }

    fn body(&self) -> [u8; Self::LEN_WITHOUT_CRC] {
        let mut body = [0u8; Self::LEN_WITHOUT_CRC];
        body[..8].copy_from_slice(&self.magic);
        body[8..10].copy_from_slice(&self.version.to_le_bytes());
        body[10..12].copy_from_slice(&self.flags.to_le_bytes());
        body[12..].copy_from_slice(&self.reserved.to_le_bytes());
        body
    }

    pub fn to_bytes(&self) -> [u8; Self::TOTAL_LEN] {
        let mut out = [0u8; Self::TOTAL_LEN];
        out[..Self::LEN_WITHOUT_CRC].copy_from_slice(&self.body());
        out[Self::LEN_WITHOUT_CRC..].copy_from_slice(&self.header_crc32.to_le_bytes());
        out
    }

    pub fn write_to<W: Write>(&self, mut w: W) -> io::Result<()> {
        w.write_all(&self.to_bytes())
    }

    /// Reads and crc-checks a header. Magic and version are left to the caller.
    pub fn read_from<R: Read>(mut r: R) -> io::Result<Self> {
        let mut raw = [0u8; Self::TOTAL_LEN];
        r.read_exact(&mut raw)?;

        let stored = u32::from_le_bytes([raw[16], raw[17], raw[18], raw[19]]);
        if crc_of(&raw[..Self::LEN_WITHOUT_CRC]) != stored {
            return Err(invalid("header CRC mismatch"));
        }
        let mut magic = [0u8; 8];
        magic.copy_from_slice(&raw[..8]);
        Ok(Self {
            magic,
            version: u16::from_le_bytes([raw[8], raw[9]]),
            flags: u16::from_le_bytes([raw[10], raw[11]]),
            reserved: u32::from_le_bytes([raw[12], raw[13], raw[14], raw[15]]),
            header_crc32: stored,
        })
    }
}

fn crc_of(bytes: &[u8]) -> u32 {
    let mut hasher = Crc32Hasher::new();
    hasher.update(bytes);
    hasher.finalize()
}

fn invalid(msg: &'static str) -> io::Error {
    io::Error::new(ErrorKind::InvalidData, msg)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    Run,
    MergeSnapshot,
}

impl FileKind {
    pub const fn magic(&self) -> [u8; 8] {
        match self {
            FileKind::Run => *b"SNMGRUN\0",
            FileKind::MergeSnapshot => *b"SNMGHIB\0",
        }
    }

    /// Header for a new file of this kind at the current format version.
    pub fn header(&self, flags: u16) -> BinaryHeader {
        BinaryHeader::new(self.magic(), FORMAT_VERSION, flags)
    }

    /// Checks that `header` belongs to this kind and to a readable version.
    pub fn validate(&self, header: &BinaryHeader) -> io::Result<()> {
        if header.magic != self.magic() {
            return Err(invalid("invalid magic"));
        }
        if header.version != FORMAT_VERSION {
            return Err(invalid("unsupported version"));
        }
        Ok(())
    }
}

/// Opens `path` and validates its header, leaving the file positioned at
/// the first byte after it.
pub fn open_validated(path: &Path, kind: FileKind) -> io::Result<(File, BinaryHeader)> {
    let mut file = File::open(path)?;
    if file.metadata()?.len() < BinaryHeader::TOTAL_LEN as u64 {
        return Err(invalid("file too small for header"));
    }
    let header = BinaryHeader::read_from(&mut file)?;
    kind.validate(&header)?;
    Ok((file, header))
}
