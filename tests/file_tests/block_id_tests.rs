//! Tests for BlockId
//!
//! These tests verify:
//! - Value equality and hashing
//! - Offset arithmetic and overflow
//! - Display and serialized form

use std::collections::{HashMap, HashSet};

use blockfile::BlockId;

#[test]
fn test_accessors() {
    let blk = BlockId::new("student.tbl", 7);

    assert_eq!(blk.file_name(), "student.tbl");
    assert_eq!(blk.number(), 7);
}

#[test]
fn test_equality_by_value() {
    let a = BlockId::new("t.tbl", 3);
    let b = BlockId::new(String::from("t.tbl"), 3);

    assert_eq!(a, b);
    assert_ne!(a, BlockId::new("t.tbl", 4));
    assert_ne!(a, BlockId::new("u.tbl", 3));
}

#[test]
fn test_usable_as_map_key() {
    let mut map = HashMap::new();
    map.insert(BlockId::new("t.tbl", 0), "first");
    map.insert(BlockId::new("t.tbl", 1), "second");
    map.insert(BlockId::new("t.tbl", 0), "replaced");

    assert_eq!(map.len(), 2);
    assert_eq!(map[&BlockId::new("t.tbl", 0)], "replaced");

    let set: HashSet<_> = (0..10).map(|i| BlockId::new("x", i % 5)).collect();
    assert_eq!(set.len(), 5);
}

#[test]
fn test_ordering_by_file_then_number() {
    let mut blocks = vec![
        BlockId::new("b", 0),
        BlockId::new("a", 2),
        BlockId::new("a", 1),
    ];
    blocks.sort();

    assert_eq!(
        blocks,
        vec![BlockId::new("a", 1), BlockId::new("a", 2), BlockId::new("b", 0)]
    );
}

#[test]
fn test_byte_offset() {
    assert_eq!(BlockId::new("t", 0).byte_offset(400), Some(0));
    assert_eq!(BlockId::new("t", 3).byte_offset(400), Some(1200));
    assert_eq!(BlockId::new("t", u64::MAX).byte_offset(2), None);
}

#[test]
fn test_display() {
    assert_eq!(BlockId::new("t.tbl", 12).to_string(), "[file t.tbl, block 12]");
}

#[test]
fn test_serialized_form_is_stable() {
    let blk = BlockId::new("log", 9);

    let encoded = bincode::serialize(&blk).unwrap();
    let decoded: BlockId = bincode::deserialize(&encoded).unwrap();

    assert_eq!(decoded, blk);
    // u64 name length + name bytes + u64 block number
    assert_eq!(encoded.len(), 8 + 3 + 8);
}
