use crate::engine::core::read_run;
use crate::engine::core::sink::{SinkMode, SinkOptions, create_sink, restore_sink};
use crate::test_helpers::factory::Factory;
use tempfile::tempdir;

fn options() -> SinkOptions {
    SinkOptions {
        target_size: 0,
        batch_bytes: 48,
        last_level: true,
    }
}

#[test]
fn isolated_sink_writes_same_run_as_embedded() {
    let dir = tempdir().unwrap();
    let embedded = dir.path().join("embedded.run");
    let isolated = dir.path().join("isolated.run");
    let entries = Factory::entry().create_list(7, 2, 30);

    for (path, mode) in [(&embedded, SinkMode::Embedded), (&isolated, SinkMode::Isolated)] {
        let mut sink = create_sink(path, &options(), mode).unwrap();
        assert_eq!(sink.mode(), mode);
        for entry in entries.clone() {
            sink.append(entry).unwrap();
        }
        assert_eq!(sink.finalize().unwrap(), 30);
    }

    assert_eq!(read_run(&isolated).unwrap(), entries);
    assert_eq!(
        std::fs::read(&embedded).unwrap(),
        std::fs::read(&isolated).unwrap()
    );
}

#[test]
fn isolated_sink_survives_suspend_and_mode_switch() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("out.run");
    let entries = Factory::entry().create_list(0, 1, 12);

    let mut sink = create_sink(&path, &options(), SinkMode::Isolated).unwrap();
    for entry in entries[..6].iter().cloned() {
        sink.append(entry).unwrap();
    }
    let bytes = sink.suspend().unwrap();

    // State is portable between deployment strategies.
    let mut sink = restore_sink(&bytes, SinkMode::Embedded).unwrap();
    assert_eq!(sink.written(), 6);
    for entry in entries[6..].iter().cloned() {
        sink.append(entry).unwrap();
    }
    assert_eq!(sink.finalize().unwrap(), 12);
    assert_eq!(read_run(&path).unwrap(), entries);
}

#[test]
fn isolated_append_error_is_returned_to_caller() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("out.run");
    let mut sink = create_sink(&path, &options(), SinkMode::Isolated).unwrap();
    sink.append(Factory::entry().with_key(3).create()).unwrap();
    assert!(sink.append(Factory::entry().with_key(3).create()).is_err());
    assert_eq!(sink.written(), 1);
    assert_eq!(sink.finalize().unwrap(), 1);
}
