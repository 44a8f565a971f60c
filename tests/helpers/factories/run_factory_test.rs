use crate::engine::core::read_run;
use crate::test_helpers::factory::{Factory, key};
use tempfile::tempdir;

#[test]
fn run_factory_writes_readable_run() {
    let dir = tempdir().unwrap();
    let path = Factory::run(dir.path())
        .with_pairs(&[(1, Some("a")), (2, None), (3, Some("c"))])
        .create("a.run");

    let entries = read_run(&path).unwrap();
    assert_eq!(entries.len(), 3);
    assert_eq!(entries[1].key, key(2));
    assert!(entries[1].is_tombstone());
}
