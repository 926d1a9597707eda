#![allow(clippy::unwrap_used, clippy::expect_used)]

mod common;

use common::{partition_key, setup, write_inventory, INVENTORY_BUCKET};
use lakeimport_core::model::DiffSide;
use lakeimport_core::{ExErrorKind, InventoryGenerator};
use lakeimport_engine::{compute_inventory_diff, ImportConfig};

fn keys(objs: &[lakeimport_core::InventoryObject]) -> Vec<&str> {
    objs.iter().map(|o| o.key.as_str()).collect()
}

#[test]
fn test_report_without_previous_lists_every_object_as_added() {
    let fx = setup();
    let url = write_inventory(&fx.store, "only", &[&[("a", "1")], &[("b", "1")]]);
    let generator = ImportConfig::default().inventory_generator(fx.store.clone());
    let current = generator.generate_inventory(&url).unwrap();

    let report = compute_inventory_diff(None, current.as_ref(), true).unwrap();
    assert!(report.dry_run);
    assert_eq!(keys(&report.added_or_changed), vec!["a", "b"]);
    assert!(report.deleted.is_empty());
    assert!(report.previous_inventory_url.is_none());
}

#[test]
fn test_report_between_two_inventories() {
    let fx = setup();
    let old = write_inventory(&fx.store, "old", &[&[("a", "1"), ("b", "1"), ("c", "1")]]);
    let new = write_inventory(&fx.store, "new", &[&[("b", "1"), ("c", "2"), ("d", "1")]]);
    let generator = ImportConfig::default().inventory_generator(fx.store.clone());
    let previous = generator.generate_inventory(&old).unwrap();
    let current = generator.generate_inventory(&new).unwrap();

    let report = compute_inventory_diff(Some(previous.as_ref()), current.as_ref(), false).unwrap();
    assert_eq!(keys(&report.added_or_changed), vec!["c", "d"]);
    assert_eq!(keys(&report.deleted), vec!["a"]);
    assert_eq!(report.previous_inventory_url.as_deref(), Some(old.as_str()));
    assert!(report.previous_import_date.is_some());

    let stats = report.stats();
    assert_eq!(stats.added_or_changed, 2);
    assert_eq!(stats.deleted, 1);
}

#[test]
fn test_report_fails_when_previous_partition_is_missing() {
    let fx = setup();
    let old = write_inventory(&fx.store, "old", &[&[("a", "1")]]);
    let new = write_inventory(&fx.store, "new", &[&[("a", "1")]]);
    std::fs::remove_file(
        fx.store
            .object_path(INVENTORY_BUCKET, &partition_key("old", 0))
            .unwrap(),
    )
    .unwrap();
    let generator = ImportConfig::default().inventory_generator(fx.store.clone());
    let previous = generator.generate_inventory(&old).unwrap();
    let current = generator.generate_inventory(&new).unwrap();

    let err = compute_inventory_diff(Some(previous.as_ref()), current.as_ref(), false).unwrap_err();
    assert_eq!(err.kind(), ExErrorKind::InventorySourceFailed);
    assert_eq!(err.side(), Some(DiffSide::Left));
    assert_eq!(err.root_cause().kind(), ExErrorKind::NotFound);
}
