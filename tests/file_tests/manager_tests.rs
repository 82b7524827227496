//! Tests for FileManager block operations
//!
//! These tests verify:
//! - Write/read round trip
//! - Append numbering and size tracking
//! - Zero-fill reads past end of file
//! - Buffer size checks
//! - Log file rebuild
//! - Sync and close

use std::fs;

use blockfile::{BlockFileError, BlockId, Config, FileManager};
use tempfile::TempDir;

const BLOCK_SIZE: usize = 400;

// =============================================================================
// Helper Functions
// =============================================================================

fn setup_manager() -> (TempDir, FileManager) {
    let temp_dir = TempDir::new().unwrap();
    let config = Config::builder()
        .home_dir(temp_dir.path())
        .db_name("testdb")
        .block_size(BLOCK_SIZE)
        .build();
    let fm = FileManager::open(config).unwrap();
    (temp_dir, fm)
}

fn setup_manager_with_logs() -> (TempDir, TempDir, FileManager) {
    let home = TempDir::new().unwrap();
    let logs = TempDir::new().unwrap();
    let config = Config::builder()
        .home_dir(home.path())
        .db_name("testdb")
        .log_base_dir(logs.path())
        .block_size(BLOCK_SIZE)
        .build();
    let fm = FileManager::open(config).unwrap();
    (home, logs, fm)
}

fn filled(byte: u8) -> Vec<u8> {
    vec![byte; BLOCK_SIZE]
}

// =============================================================================
// Read / Write Tests
// =============================================================================

#[test]
fn test_write_then_read_round_trip() {
    let (_temp, fm) = setup_manager();
    let blk = BlockId::new("t.tbl", 3);
    let data: Vec<u8> = (0..BLOCK_SIZE).map(|i| (i % 251) as u8).collect();

    fm.write(&blk, &data).unwrap();

    let mut out = filled(0xFF);
    fm.read(&blk, &mut out).unwrap();
    assert_eq!(out, data);
}

#[test]
fn test_write_extends_file_to_block_end() {
    let (_temp, fm) = setup_manager();

    fm.write(&BlockId::new("t.tbl", 4), &filled(1)).unwrap();

    assert_eq!(fm.size("t.tbl").unwrap(), 5);
    let len = fs::metadata(fm.data_dir().join("t.tbl")).unwrap().len();
    assert_eq!(len, 5 * BLOCK_SIZE as u64);
}

#[test]
fn test_overwrite_does_not_touch_neighbours() {
    let (_temp, fm) = setup_manager();
    for byte in 0..3u8 {
        fm.append("t.tbl", &filled(byte)).unwrap();
    }

    fm.write(&BlockId::new("t.tbl", 1), &filled(9)).unwrap();

    let mut out = filled(0);
    for (n, expected) in [(0u64, 0u8), (1, 9), (2, 2)] {
        fm.read(&BlockId::new("t.tbl", n), &mut out).unwrap();
        assert_eq!(out, filled(expected), "block {}", n);
    }
}

#[test]
fn test_read_past_end_zero_fills() {
    let (_temp, fm) = setup_manager();
    fm.append("t.tbl", &filled(7)).unwrap();

    let mut out = filled(0xEE);
    fm.read(&BlockId::new("t.tbl", 10), &mut out).unwrap();

    assert_eq!(out, filled(0));
    // Reading does not grow the file
    assert_eq!(fm.size("t.tbl").unwrap(), 1);
}

#[test]
fn test_read_partial_trailing_block_zero_fills_rest() {
    let (_temp, fm) = setup_manager();
    fs::write(fm.data_dir().join("partial.tbl"), [3u8; 100]).unwrap();

    let mut out = filled(0xEE);
    fm.read(&BlockId::new("partial.tbl", 0), &mut out).unwrap();

    assert_eq!(&out[..100], &[3u8; 100][..]);
    assert!(out[100..].iter().all(|&b| b == 0));
}

#[test]
fn test_read_of_missing_file_creates_empty_file() {
    let (_temp, fm) = setup_manager();

    let mut out = filled(1);
    fm.read(&BlockId::new("new.tbl", 0), &mut out).unwrap();

    assert_eq!(out, filled(0));
    assert!(fm.data_dir().join("new.tbl").exists());
    assert_eq!(fm.size("new.tbl").unwrap(), 0);
}

#[test]
fn test_wrong_buffer_size_rejected() {
    let (_temp, fm) = setup_manager();
    let blk = BlockId::new("t.tbl", 0);

    let err = fm.write(&blk, &[0u8; BLOCK_SIZE - 1]).unwrap_err();
    assert!(matches!(
        err,
        BlockFileError::InvalidBufferSize { expected: BLOCK_SIZE, actual } if actual == BLOCK_SIZE - 1
    ));
    assert!(!err.is_startup_error());

    let mut big = vec![0u8; BLOCK_SIZE + 1];
    assert!(matches!(
        fm.read(&blk, &mut big),
        Err(BlockFileError::InvalidBufferSize { .. })
    ));
    assert!(matches!(
        fm.append("t.tbl", &[0u8; 10]),
        Err(BlockFileError::InvalidBufferSize { .. })
    ));

    // Rejected before touching disk
    assert!(!fm.data_dir().join("t.tbl").exists());
}

#[test]
fn test_block_number_overflow_rejected() {
    let (_temp, fm) = setup_manager();
    let blk = BlockId::new("t.tbl", u64::MAX / 2);

    let err = fm.write(&blk, &filled(0)).unwrap_err();

    assert!(matches!(err, BlockFileError::BlockOutOfRange(b) if b == blk));
}

// =============================================================================
// Append / Size Tests
// =============================================================================

#[test]
fn test_append_scenario_block_size_400() {
    let (_temp, fm) = setup_manager();
    let a = filled(b'A');
    let b = filled(b'B');

    assert_eq!(fm.size("T.tbl").unwrap(), 0);

    assert_eq!(fm.append("T.tbl", &a).unwrap(), BlockId::new("T.tbl", 0));
    assert_eq!(fm.size("T.tbl").unwrap(), 1);

    assert_eq!(fm.append("T.tbl", &b).unwrap(), BlockId::new("T.tbl", 1));
    assert_eq!(fm.size("T.tbl").unwrap(), 2);

    let mut out = filled(0);
    fm.read(&BlockId::new("T.tbl", 0), &mut out).unwrap();
    assert_eq!(out, a);
    fm.read(&BlockId::new("T.tbl", 1), &mut out).unwrap();
    assert_eq!(out, b);
}

#[test]
fn test_append_returns_size_before_call() {
    let (_temp, fm) = setup_manager();

    for _ in 0..20 {
        let before = fm.size("t.tbl").unwrap();
        let blk = fm.append("t.tbl", &filled(1)).unwrap();
        assert_eq!(blk.number(), before);
        assert_eq!(fm.size("t.tbl").unwrap(), before + 1);
    }
}

#[test]
fn test_size_rounds_down() {
    let (_temp, fm) = setup_manager();
    fs::write(fm.data_dir().join("odd.tbl"), vec![0u8; BLOCK_SIZE * 2 + 150]).unwrap();

    assert_eq!(fm.size("odd.tbl").unwrap(), 2);

    // Append lands on the partial block
    let blk = fm.append("odd.tbl", &filled(4)).unwrap();
    assert_eq!(blk.number(), 2);
    assert_eq!(fm.size("odd.tbl").unwrap(), 3);
}

#[test]
fn test_files_are_independent() {
    let (_temp, fm) = setup_manager();

    fm.append("a.tbl", &filled(1)).unwrap();
    fm.append("a.tbl", &filled(1)).unwrap();
    let blk = fm.append("b.tbl", &filled(2)).unwrap();

    assert_eq!(blk, BlockId::new("b.tbl", 0));
    assert_eq!(fm.size("a.tbl").unwrap(), 2);
    assert_eq!(fm.size("b.tbl").unwrap(), 1);
    assert_eq!(fm.open_channel_count(), 2);
}

#[test]
fn test_invalid_file_name_rejected() {
    let (_temp, fm) = setup_manager();

    let err = fm.append("../outside.tbl", &filled(0)).unwrap_err();

    assert!(matches!(err, BlockFileError::InvalidFileName(_)));
}

#[test]
fn test_sync_on_write() {
    let temp_dir = TempDir::new().unwrap();
    let config = Config::builder()
        .home_dir(temp_dir.path())
        .db_name("syncdb")
        .block_size(BLOCK_SIZE)
        .sync_on_write(true)
        .build();
    let fm = FileManager::open(config).unwrap();

    let blk = fm.append("t.tbl", &filled(6)).unwrap();
    fm.write(&blk, &filled(8)).unwrap();

    let on_disk = fs::read(fm.data_dir().join("t.tbl")).unwrap();
    assert_eq!(on_disk, filled(8));
}

// =============================================================================
// Log File Tests
// =============================================================================

#[test]
fn test_log_file_lives_in_log_directory() {
    let (_home, logs, fm) = setup_manager_with_logs();
    let log_name = fm.log_file_name().to_string();

    fm.append(&log_name, &filled(1)).unwrap();

    assert!(logs.path().join("testdb").join(&log_name).exists());
    assert!(!fm.data_dir().join(&log_name).exists());
}

#[test]
fn test_rebuild_log_file_leaves_single_empty_log() {
    let (_home, _logs, fm) = setup_manager_with_logs();
    let log_name = fm.log_file_name().to_string();
    fm.append(&log_name, &filled(1)).unwrap();
    fm.append(&log_name, &filled(2)).unwrap();
    fs::write(fm.log_dir().join("archived.log"), b"old").unwrap();
    fs::write(fm.log_dir().join("keep.txt"), b"not a log").unwrap();

    let old_channel = fm.channel(&log_name).unwrap();
    fm.rebuild_log_file().unwrap();

    assert!(old_channel.is_closed());
    let logs: Vec<_> = fs::read_dir(fm.log_dir())
        .unwrap()
        .map(|e| e.unwrap().file_name().into_string().unwrap())
        .filter(|name| name.ends_with(".log"))
        .collect();
    assert_eq!(logs, vec![log_name.clone()]);
    assert!(fm.log_dir().join("keep.txt").exists());

    assert_eq!(fm.size(&log_name).unwrap(), 0);
    let new_channel = fm.channel(&log_name).unwrap();
    assert!(!new_channel.is_closed());
    assert_eq!(fm.append(&log_name, &filled(3)).unwrap().number(), 0);
}

#[test]
fn test_rebuild_log_file_in_shared_directory_keeps_tables() {
    let (_temp, fm) = setup_manager();
    let log_name = fm.log_file_name().to_string();
    fm.append("t.tbl", &filled(1)).unwrap();
    fm.append(&log_name, &filled(2)).unwrap();

    fm.rebuild_log_file().unwrap();

    assert_eq!(fm.size("t.tbl").unwrap(), 1);
    assert!(!fm.channel("t.tbl").unwrap().is_closed());
    assert_eq!(fm.size(&log_name).unwrap(), 0);
}

#[test]
fn test_rebuild_log_file_does_not_close_same_named_data_file() {
    let (_home, _logs, fm) = setup_manager_with_logs();
    // "old.log" opened by name lives in the data directory
    fm.append("old.log", &filled(1)).unwrap();
    let data_channel = fm.channel("old.log").unwrap();
    fs::write(fm.log_dir().join("old.log"), b"stale").unwrap();

    fm.rebuild_log_file().unwrap();

    assert!(!data_channel.is_closed());
    assert!(!fm.log_dir().join("old.log").exists());
    assert_eq!(fm.size("old.log").unwrap(), 1);
}

#[test]
fn test_rebuild_log_file_replaces_channel_to_deleted_log() {
    let (_home, _logs, fm) = setup_manager_with_logs();
    let log_name = fm.log_file_name().to_string();
    fm.append(&log_name, &filled(1)).unwrap();
    let old_channel = fm.channel(&log_name).unwrap();

    // Log file vanishes from disk while its channel is still registered
    fs::remove_file(fm.log_dir().join(&log_name)).unwrap();
    fm.rebuild_log_file().unwrap();

    assert!(old_channel.is_closed());
    assert!(fm.log_dir().join(&log_name).exists());

    let blk = fm.append(&log_name, &filled(2)).unwrap();
    assert_eq!(blk.number(), 0);
    assert_eq!(fm.size(&log_name).unwrap(), 1);
    let on_disk = fs::read(fm.log_dir().join(&log_name)).unwrap();
    assert_eq!(on_disk, filled(2));
}

// =============================================================================
// Sync / Close Tests
// =============================================================================

#[test]
fn test_sync_and_sync_all() {
    let (_temp, fm) = setup_manager();
    fm.append("a.tbl", &filled(1)).unwrap();
    fm.append("b.tbl", &filled(2)).unwrap();

    fm.sync("a.tbl").unwrap();
    fm.sync_all().unwrap();
}

#[test]
fn test_close_releases_channels_and_reopens_on_demand() {
    let (_temp, fm) = setup_manager();
    fm.append("t.tbl", &filled(5)).unwrap();
    let channel = fm.channel("t.tbl").unwrap();
    assert_eq!(fm.open_channel_count(), 1);

    fm.close().unwrap();

    assert!(channel.is_closed());
    assert_eq!(fm.open_channel_count(), 0);

    let mut out = filled(0);
    fm.read(&BlockId::new("t.tbl", 0), &mut out).unwrap();
    assert_eq!(out, filled(5));
}

#[test]
fn test_channels_retained_until_close() {
    let (_temp, fm) = setup_manager();

    for i in 0..10 {
        fm.append(&format!("f{}.tbl", i), &filled(0)).unwrap();
    }
    for i in 0..10 {
        fm.size(&format!("f{}.tbl", i)).unwrap();
    }

    assert_eq!(fm.open_channel_count(), 10);
}

#[test]
fn test_operations_on_closed_channel_report_channel_closed() {
    let (_temp, fm) = setup_manager();
    let blk = fm.append("t.tbl", &filled(1)).unwrap();

    // Close the registered channel behind the manager's back
    fm.channel("t.tbl").unwrap().close().unwrap();

    let mut out = filled(0);
    let err = fm.read(&blk, &mut out).unwrap_err();
    assert!(matches!(err, BlockFileError::ChannelClosed(ref p) if p == &fm.data_dir().join("t.tbl")));
    assert!(!err.is_startup_error());

    assert!(matches!(
        fm.write(&blk, &filled(2)),
        Err(BlockFileError::ChannelClosed(_))
    ));
    assert!(matches!(
        fm.append("t.tbl", &filled(3)),
        Err(BlockFileError::ChannelClosed(_))
    ));
    assert!(matches!(
        fm.size("t.tbl"),
        Err(BlockFileError::ChannelClosed(_))
    ));
}
