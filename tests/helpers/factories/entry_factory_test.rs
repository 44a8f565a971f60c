use crate::test_helpers::factory::{Factory, key};

#[test]
fn create_list_produces_ascending_keys() {
    let entries = Factory::entry().with_value("v").create_list(10, 5, 4);
    let keys: Vec<_> = entries.iter().map(|e| e.key.clone()).collect();
    assert_eq!(keys, vec![key(10), key(15), key(20), key(25)]);
    assert!(entries.windows(2).all(|w| w[0].key < w[1].key));
}

#[test]
fn tombstone_list_carries_tombstones() {
    let entries = Factory::entry().tombstone().create_list(0, 1, 3);
    assert!(entries.iter().all(|e| e.is_tombstone()));
}
