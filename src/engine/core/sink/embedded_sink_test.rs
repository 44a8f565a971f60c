use crate::engine::core::read_run;
use crate::engine::core::sink::{
    EmbeddedSink, SinkMode, SinkOptions, create_sink, restore_sink,
};
use crate::engine::errors::SinkError;
use crate::test_helpers::factory::Factory;
use tempfile::tempdir;

fn options() -> SinkOptions {
    SinkOptions {
        target_size: 16,
        batch_bytes: 64,
        last_level: false,
    }
}

#[test]
fn finalize_returns_written_count() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("out.run");
    let entries = Factory::entry().create_list(0, 3, 9);

    let mut sink = create_sink(&path, &options(), SinkMode::Embedded).unwrap();
    assert_eq!(sink.mode(), SinkMode::Embedded);
    for entry in entries.clone() {
        sink.append(entry).unwrap();
    }
    assert_eq!(sink.written(), 9);
    assert_eq!(sink.finalize().unwrap(), 9);
    assert_eq!(read_run(&path).unwrap(), entries);
}

#[test]
fn suspended_sink_restores_and_finishes_identically() {
    let dir = tempdir().unwrap();
    let straight = dir.path().join("straight.run");
    let paused = dir.path().join("paused.run");
    let entries = Factory::entry().create_list(0, 1, 21);

    let mut sink = create_sink(&straight, &options(), SinkMode::Embedded).unwrap();
    for entry in entries.clone() {
        sink.append(entry).unwrap();
    }
    sink.finalize().unwrap();

    let mut sink = create_sink(&paused, &options(), SinkMode::Embedded).unwrap();
    for (i, entry) in entries.clone().into_iter().enumerate() {
        if i % 5 == 4 {
            let bytes = sink.suspend().unwrap();
            sink = restore_sink(&bytes, SinkMode::Embedded).unwrap();
        }
        sink.append(entry).unwrap();
    }
    assert_eq!(sink.finalize().unwrap(), 21);

    assert_eq!(
        std::fs::read(&straight).unwrap(),
        std::fs::read(&paused).unwrap()
    );
}

#[test]
fn out_of_order_append_is_a_sink_error() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("out.run");
    let mut sink = EmbeddedSink::create(&path, options()).unwrap();
    sink.append_entry(Factory::entry().with_key(2).create()).unwrap();
    let res = sink.append_entry(Factory::entry().with_key(1).create());
    assert!(matches!(res, Err(SinkError::Run(_))));
    assert_eq!(sink.written_count(), 1);
}

#[test]
fn create_failure_is_reported_as_create() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("no").join("such").join("out.run");
    let res = create_sink(&path, &options(), SinkMode::Embedded);
    assert!(matches!(res, Err(SinkError::Create { .. })));
}

#[test]
fn corrupt_state_bytes_are_rejected() {
    assert!(restore_sink(&[1, 2, 3], SinkMode::Embedded).is_err());
}
