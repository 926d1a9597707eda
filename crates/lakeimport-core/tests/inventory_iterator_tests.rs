#![allow(clippy::unwrap_used, clippy::expect_used)]

mod common;

use std::sync::Arc;

use common::{drain_keys, factory_with, manifest_iter, obj, BUCKET};
use lakeimport_core::errors::{ExError, ExErrorKind, Result};
use lakeimport_core::inventory::InventoryIterator;
use lakeimport_core::source::{MemoryRowSourceFactory, RowBatchSource, RowSourceFactory};
use lakeimport_core::{InventoryObject, ManifestInventoryIterator};
use proptest::prelude::*;

const FILES: &[(&str, &[&str])] = &[
    ("f1", &["f1row1", "f1row2"]),
    ("f2", &["f2row1", "f2row2"]),
    ("f3", &["f3row1", "f3row2"]),
    ("f4", &["f4row1", "f4row2", "f4row3", "f4row4", "f4row5", "f4row6", "f4row7"]),
    ("f5", &["a1", "a2", "a3"]),
    ("f6", &["a4", "a5", "a6", "a7"]),
    ("empty", &[]),
];

const BATCH_SIZES: &[i64] = &[0, 10_000, 3, 6, 2, 1];

/// FILES plus two files holding a row that fails to decode
fn fixture() -> MemoryRowSourceFactory {
    factory_with(FILES)
        .with_raw_file(
            "err_file1",
            vec![Some(obj("a4")), None, Some(obj("a6")), Some(obj("a7"))],
        )
        .with_raw_file("err_file2", vec![None])
}

fn expected_keys(files: &[&str]) -> Vec<String> {
    files
        .iter()
        .flat_map(|f| {
            FILES
                .iter()
                .find(|(name, _)| name == f)
                .map(|(_, keys)| keys.to_vec())
                .unwrap_or_default()
        })
        .map(str::to_string)
        .collect()
}

// ========== Flattening ==========

#[test]
fn test_files_flatten_in_manifest_order_for_every_batch_size() {
    let cases: &[&[&str]] = &[
        &["f1", "f2"],
        &["f3", "f2", "f1"],
        &["f1", "f2", "f3", "f4"],
        &["f1", "f4"],
        &["f5", "f6"],
        &["f1"],
        &["empty", "f1", "empty", "f2"],
    ];

    for batch_size in BATCH_SIZES {
        for files in cases {
            // Order checking is about sorted inventories; these cases
            // deliberately list files out of order.
            let mut it = manifest_iter(Arc::new(fixture()), files, *batch_size)
                .with_key_order_check(false);
            let keys = drain_keys(&mut it);
            assert!(
                it.err().is_none(),
                "unexpected error for {:?} batch {}: {:?}",
                files,
                batch_size,
                it.err()
            );
            assert_eq!(keys, expected_keys(files), "files {:?} batch {}", files, batch_size);
        }
    }
}

#[test]
fn test_empty_manifest_is_exhausted_without_error() {
    let mut it = manifest_iter(Arc::new(fixture()), &[], 0);
    assert!(!it.next());
    assert!(it.get().is_none());
    assert!(it.err().is_none());
}

#[test]
fn test_single_row_files_with_batch_one() {
    let factory = factory_with(&[("x", &["k1"]), ("y", &["k2"]), ("z", &["k3"])]);
    let mut it = manifest_iter(Arc::new(factory), &["x", "y", "z"], 1);
    assert_eq!(drain_keys(&mut it), vec!["k1", "k2", "k3"]);
    assert!(it.err().is_none());
}

#[test]
fn test_non_positive_batch_size_uses_default() {
    let it = manifest_iter(Arc::new(fixture()), &["f1"], -3);
    assert_eq!(it.read_batch_size(), lakeimport_core::inventory::DEFAULT_READ_BATCH_SIZE);
}

// ========== Laziness ==========

#[test]
fn test_files_open_lazily_one_at_a_time() {
    let factory = Arc::new(fixture());
    let mut it = manifest_iter(factory.clone(), &["f1", "f2", "f3"], 1);
    assert!(factory.opened().is_empty(), "nothing opens before next");

    assert!(it.next());
    assert_eq!(factory.opened(), vec!["f1"]);
    assert!(it.next());
    assert_eq!(factory.opened(), vec!["f1"]);

    assert!(it.next());
    assert_eq!(it.get().unwrap().key, "f2row1");
    assert_eq!(factory.opened(), vec!["f1", "f2"]);
}

// ========== Errors ==========

#[test]
fn test_decode_error_stops_iteration_for_every_batch_size() {
    let cases: &[&[&str]] = &[
        &["f1", "err_file2"],
        &["f5", "err_file1"],
        &["err_file2", "f1"],
        &["f1", "missing_file"],
    ];

    for batch_size in BATCH_SIZES {
        for files in cases {
            let mut it = manifest_iter(Arc::new(fixture()), files, *batch_size);
            drain_keys(&mut it);
            assert!(
                it.err().is_some(),
                "expected error for {:?} batch {}",
                files,
                batch_size
            );
        }
    }
}

#[test]
fn test_error_names_file_and_row() {
    let mut it = manifest_iter(Arc::new(fixture()), &["f5", "err_file1"], 0);
    let keys = drain_keys(&mut it);

    // The failing batch is discarded whole.
    assert_eq!(keys, vec!["a1", "a2", "a3"]);
    let err = it.err().unwrap();
    assert_eq!(err.kind(), ExErrorKind::Decode);
    assert_eq!(err.file(), Some("err_file1"));
    assert_eq!(err.row(), Some(1));
}

#[test]
fn test_rows_before_failing_batch_are_yielded() {
    // Batch of one: a4 is its own batch and is yielded before row 1 fails.
    let mut it = manifest_iter(Arc::new(fixture()), &["err_file1"], 1);
    assert_eq!(drain_keys(&mut it), vec!["a4"]);
    assert_eq!(it.err().unwrap().row(), Some(1));
}

#[test]
fn test_error_is_sticky_and_later_files_never_open() {
    let factory = Arc::new(fixture());
    let mut it = manifest_iter(factory.clone(), &["err_file2", "f1", "f2"], 0);

    assert!(!it.next());
    let first = it.err().unwrap().to_string();

    for _ in 0..3 {
        assert!(!it.next());
        assert!(it.get().is_none());
        assert_eq!(it.err().unwrap().to_string(), first);
    }
    assert_eq!(factory.opened(), vec!["err_file2"]);
}

#[test]
fn test_missing_file_is_not_found() {
    let mut it = manifest_iter(Arc::new(fixture()), &["f1", "missing_file"], 0);
    assert_eq!(drain_keys(&mut it), vec!["f1row1", "f1row2"]);
    let err = it.err().unwrap();
    assert_eq!(err.kind(), ExErrorKind::NotFound);
    assert_eq!(err.file(), Some("missing_file"));
}

#[test]
fn test_io_error_surfaces_with_file() {
    let factory = fixture().with_io_error("f4", 4);
    let mut it = manifest_iter(Arc::new(factory), &["f4"], 2);
    let keys = drain_keys(&mut it);
    assert_eq!(keys, vec!["f4row1", "f4row2", "f4row3", "f4row4"]);
    let err = it.err().unwrap();
    assert_eq!(err.kind(), ExErrorKind::Io);
    assert_eq!(err.file(), Some("f4"));
}

#[test]
fn test_wrong_bucket_fails_on_first_open() {
    let mut it = ManifestInventoryIterator::new(
        Arc::new(fixture()),
        "some-other-bucket",
        vec!["f1".to_string()],
    );
    assert!(!it.next());
    assert_eq!(it.err().unwrap().kind(), ExErrorKind::NotFound);
}

// ========== Version filtering ==========

fn versions_factory() -> MemoryRowSourceFactory {
    MemoryRowSourceFactory::new(BUCKET).with_file(
        "versions",
        vec![
            obj("a").with_latest(false),
            obj("a"),
            obj("b").with_delete_marker(true),
            obj("c").with_latest(false),
            obj("d"),
        ],
    )
}

#[test]
fn test_non_latest_versions_and_delete_markers_are_skipped() {
    for batch_size in BATCH_SIZES {
        let mut it = manifest_iter(Arc::new(versions_factory()), &["versions"], *batch_size);
        assert_eq!(drain_keys(&mut it), vec!["a", "d"]);
        assert!(it.err().is_none());
        assert_eq!(it.rows_read(), 5);
    }
}

#[test]
fn test_file_of_only_skipped_rows_behaves_like_empty() {
    let factory = factory_with(&[("f1", &["f1row1"])]).with_file(
        "markers",
        vec![obj("m1").with_delete_marker(true), obj("m2").with_latest(false)],
    );
    let mut it = manifest_iter(Arc::new(factory), &["markers", "f1"], 1);
    assert_eq!(drain_keys(&mut it), vec!["f1row1"]);
}

// ========== Truncation ==========

/// Announces more rows than it can deliver
struct ShortSource {
    rows: Vec<InventoryObject>,
    announced: u64,
}

impl RowBatchSource for ShortSource {
    fn read_batch(&mut self, buf: &mut Vec<InventoryObject>, capacity: usize) -> Result<usize> {
        buf.clear();
        let n = self.rows.len().min(capacity);
        buf.extend(self.rows.drain(..n));
        Ok(n)
    }

    fn total_rows(&self) -> u64 {
        self.announced
    }
}

struct ShortFactory;

impl RowSourceFactory for ShortFactory {
    fn open(&self, _bucket: &str, key: &str) -> Result<Box<dyn RowBatchSource>> {
        if key != "short" {
            return Err(ExError::new(ExErrorKind::NotFound).with_file(key));
        }
        Ok(Box::new(ShortSource {
            rows: vec![obj("k1"), obj("k2")],
            announced: 5,
        }))
    }
}

#[test]
fn test_file_shorter_than_announced_is_truncated() {
    for batch_size in [0, 1, 2, 3] {
        let mut it = ManifestInventoryIterator::new(
            Arc::new(ShortFactory),
            BUCKET,
            vec!["short".to_string()],
        )
        .with_read_batch_size(batch_size);

        assert_eq!(drain_keys(&mut it), vec!["k1", "k2"], "batch {}", batch_size);
        let err = it.err().expect("truncation must be reported");
        assert_eq!(err.kind(), ExErrorKind::TruncatedPartition);
        assert_eq!(err.file(), Some("short"));
    }
}

/// Holds one row more than the three it announces
struct LongSource {
    rows: Vec<InventoryObject>,
}

impl RowBatchSource for LongSource {
    fn read_batch(&mut self, buf: &mut Vec<InventoryObject>, capacity: usize) -> Result<usize> {
        buf.clear();
        let n = self.rows.len().min(capacity);
        buf.extend(self.rows.drain(..n));
        Ok(n)
    }

    fn total_rows(&self) -> u64 {
        3
    }

    fn check_exhausted(&mut self) -> Result<()> {
        if self.rows.is_empty() {
            Ok(())
        } else {
            Err(ExError::new(ExErrorKind::TruncatedPartition).with_message("extra rows"))
        }
    }
}

struct LongFactory;

impl RowSourceFactory for LongFactory {
    fn open(&self, _bucket: &str, key: &str) -> Result<Box<dyn RowBatchSource>> {
        let rows = (1..=4).map(|i| obj(&format!("{}-{}", key, i))).collect();
        Ok(Box::new(LongSource { rows }))
    }
}

#[test]
fn test_file_longer_than_announced_fails_before_next_file() {
    for batch_size in [0, 1, 2, 3] {
        let mut it = ManifestInventoryIterator::new(
            Arc::new(LongFactory),
            BUCKET,
            vec!["long".to_string(), "next".to_string()],
        )
        .with_read_batch_size(batch_size);

        assert_eq!(
            drain_keys(&mut it),
            vec!["long-1", "long-2", "long-3"],
            "batch {}",
            batch_size
        );
        let err = it.err().expect("extra rows must be reported");
        assert_eq!(err.kind(), ExErrorKind::TruncatedPartition);
        assert_eq!(err.file(), Some("long"));
    }
}

// ========== Key order ==========

#[test]
fn test_out_of_order_files_latch_ordering_violation() {
    let mut it = manifest_iter(Arc::new(fixture()), &["f6", "f5"], 0);
    assert_eq!(drain_keys(&mut it), vec!["a4", "a5", "a6", "a7"]);

    let err = it.err().unwrap();
    assert_eq!(err.kind(), ExErrorKind::OrderingViolation);
    assert_eq!(err.key(), Some("a1"));
    assert_eq!(err.file(), Some("f5"));
    assert!(!it.next());
}

#[test]
fn test_order_check_can_be_disabled() {
    let mut it = manifest_iter(Arc::new(fixture()), &["f6", "f5"], 0).with_key_order_check(false);
    assert_eq!(
        drain_keys(&mut it),
        vec!["a4", "a5", "a6", "a7", "a1", "a2", "a3"]
    );
    assert!(it.err().is_none());
}

#[test]
fn test_duplicate_effective_keys_latch_error() {
    for batch_size in BATCH_SIZES {
        let factory = MemoryRowSourceFactory::new(BUCKET).with_file("dup", vec![obj("k"), obj("k")]);
        let mut it = manifest_iter(Arc::new(factory), &["dup"], *batch_size);
        assert_eq!(drain_keys(&mut it), vec!["k"]);

        let err = it.err().expect("duplicate must be reported");
        assert_eq!(err.kind(), ExErrorKind::DuplicateKey);
        assert_eq!(err.key(), Some("k"));
        assert_eq!(err.file(), Some("dup"));
    }
}

#[test]
fn test_duplicate_across_files_is_caught_without_order_check() {
    let factory = MemoryRowSourceFactory::new(BUCKET)
        .with_file("p1", vec![obj("a"), obj("b")])
        .with_file("p2", vec![obj("b"), obj("c")]);
    let mut it = manifest_iter(Arc::new(factory), &["p1", "p2"], 0).with_key_order_check(false);
    assert_eq!(drain_keys(&mut it), vec!["a", "b"]);

    let err = it.err().unwrap();
    assert_eq!(err.kind(), ExErrorKind::DuplicateKey);
    assert_eq!(err.file(), Some("p2"));
}

// ========== Properties ==========

fn sorted_partitions() -> impl Strategy<Value = Vec<Vec<String>>> {
    prop::collection::vec(prop::collection::vec("[a-z]{1,5}", 0..6), 0..6).prop_map(|files| {
        let mut all: Vec<String> = files.iter().flatten().cloned().collect();
        all.sort();
        all.dedup();
        let mut rest = all.into_iter();
        files
            .iter()
            .map(|f| rest.by_ref().take(f.len()).collect())
            .collect()
    })
}

proptest! {
    #[test]
    fn prop_output_is_independent_of_batch_size(
        partitions in sorted_partitions(),
        batch_size in 1i64..12,
    ) {
        let names: Vec<String> = (0..partitions.len()).map(|i| format!("part-{}", i)).collect();
        let factory = partitions.iter().zip(&names).fold(
            MemoryRowSourceFactory::new(BUCKET),
            |f, (keys, name)| f.with_file(name.clone(), keys.iter().map(|k| obj(k)).collect()),
        );
        let expected: Vec<String> = partitions.iter().flatten().cloned().collect();

        let mut it = ManifestInventoryIterator::new(Arc::new(factory), BUCKET, names)
            .with_read_batch_size(batch_size);
        let keys = drain_keys(&mut it);

        prop_assert!(it.err().is_none());
        prop_assert_eq!(keys, expected);
    }
}
