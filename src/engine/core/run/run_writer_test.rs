use crate::engine::core::run::{Entry, RunReader, RunWriter, read_run};
use crate::engine::errors::RunError;
use crate::test_helpers::factory::{Factory, key};
use std::fs;
use tempfile::tempdir;

#[test]
fn finish_reports_entry_count_and_writes_trailer() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("out.run");

    let mut writer = RunWriter::create(&path, 32).unwrap();
    for entry in Factory::entry().create_list(0, 1, 20) {
        writer.add(entry).unwrap();
    }
    assert_eq!(writer.finish().unwrap(), 20);

    let mut reader = RunReader::open(&path).unwrap();
    let mut frames = 0;
    let mut next = reader.first_batch().unwrap();
    while let Some(batch) = next {
        assert!(!batch.is_empty());
        frames += 1;
        next = reader.next_batch().unwrap();
    }
    assert!(frames > 1, "small batch_bytes should split into several frames");
    assert_eq!(reader.entry_count(), Some(20));
}

#[test]
fn rejects_duplicate_and_descending_keys() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("out.run");
    let mut writer = RunWriter::create(&path, 4096).unwrap();

    writer.add(Factory::entry().with_key(5).create()).unwrap();
    let dup = writer.add(Factory::entry().with_key(5).create());
    assert!(matches!(dup, Err(RunError::OutOfOrder(_))));
    let back = writer.add(Factory::entry().with_key(4).create());
    assert!(matches!(back, Err(RunError::OutOfOrder(_))));
    assert_eq!(writer.entry_count(), 1);
}

#[test]
fn empty_run_is_valid() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("empty.run");
    assert_eq!(RunWriter::create(&path, 64).unwrap().finish().unwrap(), 0);
    assert!(read_run(&path).unwrap().is_empty());
}

#[test]
fn suspend_and_resume_continue_the_same_run() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("out.run");
    let entries = Factory::entry().create_list(0, 1, 30);

    let mut writer = RunWriter::create(&path, 48).unwrap();
    for entry in entries[..13].iter().cloned() {
        writer.add(entry).unwrap();
    }
    let state = writer.suspend().unwrap();
    assert_eq!(state.entry_count, 13);
    assert_eq!(fs::metadata(&path).unwrap().len(), state.file_len);

    let mut writer = RunWriter::resume(state).unwrap();
    for entry in entries[13..].iter().cloned() {
        writer.add(entry).unwrap();
    }
    assert_eq!(writer.finish().unwrap(), 30);
    assert_eq!(read_run(&path).unwrap(), entries);
}

#[test]
fn resume_keeps_order_check() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("out.run");
    let mut writer = RunWriter::create(&path, 4096).unwrap();
    writer.add(Entry::put(key(9), b"v".to_vec())).unwrap();

    let mut writer = RunWriter::resume(writer.suspend().unwrap()).unwrap();
    assert!(writer.add(Entry::put(key(3), b"v".to_vec())).is_err());
}

#[test]
fn create_in_missing_directory_fails_with_open_error() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("missing").join("out.run");
    assert!(matches!(
        RunWriter::create(&path, 64),
        Err(RunError::Open { .. })
    ));
}

#[test]
fn oversized_entry_is_rejected_and_writer_stays_usable() {
    use crate::engine::core::run::run_writer::MAX_BATCH_BYTES;

    let dir = tempdir().unwrap();
    let path = dir.path().join("out.run");
    let mut writer = RunWriter::create(&path, 4096).unwrap();

    let huge = Entry::put(key(1), vec![7u8; MAX_BATCH_BYTES + 1]);
    let res = writer.add(huge);
    assert!(matches!(res, Err(RunError::Oversized(_))));

    writer.add(Entry::put(key(1), b"small".to_vec())).unwrap();
    assert_eq!(writer.finish().unwrap(), 1);
    assert_eq!(read_run(&path).unwrap().len(), 1);
}

#[test]
fn unbounded_batch_bytes_still_produces_readable_frames() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("out.run");
    let mut writer = RunWriter::create(&path, usize::MAX).unwrap();

    // Together these exceed one frame; the writer must split them.
    for k in 0..5 {
        writer
            .add(Entry::put(key(k), vec![k as u8; 15 * 1024 * 1024]))
            .unwrap();
    }
    assert_eq!(writer.finish().unwrap(), 5);

    let entries = read_run(&path).unwrap();
    assert_eq!(entries.len(), 5);
    assert_eq!(entries[4].key, key(4));
}
