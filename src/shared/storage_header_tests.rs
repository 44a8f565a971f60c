use crate::shared::storage_header::{BinaryHeader, FORMAT_VERSION, FileKind, open_validated};
use std::fs::File;
use std::io::{Cursor, Read, Write};
use tempfile::tempdir;

#[test]
fn run_header_roundtrip_ok() {
    let hdr = FileKind::Run.header(0);
    let mut buf = Vec::new();
    hdr.write_to(&mut buf).unwrap();
    assert_eq!(buf.len(), BinaryHeader::TOTAL_LEN);
    assert_eq!(&buf[..8], b"SNMGRUN\0");

    let read = BinaryHeader::read_from(Cursor::new(buf)).unwrap();
    assert_eq!(read, hdr);
    assert_eq!(read.version, FORMAT_VERSION);
}

#[test]
fn flipped_magic_byte_fails_crc() {
    let mut buf = FileKind::MergeSnapshot.header(1).to_bytes();
    buf[0] ^= 0xFF;
    assert!(BinaryHeader::read_from(Cursor::new(buf)).is_err());
}

#[test]
fn truncated_header_rejected() {
    let bytes = FileKind::Run.header(0).to_bytes();
    for len in 0..BinaryHeader::TOTAL_LEN {
        assert!(
            BinaryHeader::read_from(Cursor::new(&bytes[..len])).is_err(),
            "len {len}"
        );
    }
}

#[test]
fn validate_rejects_other_kind_and_version() {
    let snapshot = FileKind::MergeSnapshot.header(0);
    assert!(FileKind::Run.validate(&snapshot).is_err());
    assert!(FileKind::MergeSnapshot.validate(&snapshot).is_ok());

    let future = BinaryHeader::new(FileKind::Run.magic(), FORMAT_VERSION + 1, 0);
    assert!(FileKind::Run.validate(&future).is_err());
}

#[test]
fn open_validated_positions_after_header() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("a.run");
    {
        let mut f = File::create(&path).unwrap();
        FileKind::Run.header(0).write_to(&mut f).unwrap();
        f.write_all(b"payload").unwrap();
    }

    let (mut file, header) = open_validated(&path, FileKind::Run).unwrap();
    assert_eq!(header.flags, 0);
    let mut rest = String::new();
    file.read_to_string(&mut rest).unwrap();
    assert_eq!(rest, "payload");

    assert!(open_validated(&path, FileKind::MergeSnapshot).is_err());
}

#[test]
fn open_validated_rejects_short_file() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("short.run");
    std::fs::write(&path, b"tiny").unwrap();
    assert!(open_validated(&path, FileKind::Run).is_err());
}
