use celsweep_core::{
    fixtures::demo_scene,
    generate_inventory_report,
    inventory::write_inventory_report,
    persistence::{backup_scene, load_scene, save_scene},
};
use proptest::prelude::*;

fn no_panic_load(path: &std::path::Path) -> bool {
    std::panic::catch_unwind(|| {
        let _ = load_scene(path);
    })
    .is_ok()
}

#[test]
fn demo_scene_survives_save_and_load() {
    let temp = tempfile::tempdir().expect("tempdir should be creatable");
    let path = temp.path().join("nested/demo.celsweep.json");
    let scene = demo_scene();

    save_scene(&path, &scene).expect("save should succeed");
    let loaded = load_scene(&path).expect("load should succeed");

    assert_eq!(loaded, scene);
}

#[test]
fn backup_copies_scene_next_to_original() {
    let temp = tempfile::tempdir().expect("tempdir should be creatable");
    let path = temp.path().join("demo.celsweep.json");
    save_scene(&path, &demo_scene()).expect("save should succeed");

    let backup = backup_scene(&path).expect("backup should succeed");

    assert_eq!(backup.parent(), path.parent());
    assert_eq!(
        load_scene(&backup).expect("backup should load"),
        demo_scene()
    );
}

#[test]
fn demo_inventory_counts_exposure() {
    let report = generate_inventory_report(&demo_scene()).expect("inventory should work");

    assert_eq!(report.drawing_count, 5);
    assert_eq!(report.column_count, 4);
    assert_eq!(report.stored_cel_count, 11);
    assert_eq!(report.exposed_cel_count, 5);
    assert_eq!(report.unexposed_cel_count, 6);
    assert_eq!(report.storage_hash.len(), 64);

    let temp = tempfile::tempdir().expect("tempdir should be creatable");
    let path = temp.path().join("reports/inventory.json");
    write_inventory_report(&path, &report).expect("write should succeed");
    assert!(path.is_file());
}

#[test]
fn missing_scene_reports_path() {
    let temp = tempfile::tempdir().expect("tempdir should be creatable");
    let error = load_scene(&temp.path().join("absent.json")).expect_err("load should fail");
    assert!(error.to_string().contains("absent.json"));
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 64,
        .. ProptestConfig::default()
    })]

    #[test]
    fn mutated_scene_payloads_do_not_panic(index in 0usize..8192usize, delta in any::<u8>()) {
        let temp = tempfile::tempdir().expect("tempdir should be creatable");
        let path = temp.path().join("corrupt_mutated.celsweep.json");
        save_scene(&path, &demo_scene()).expect("saving fixture scene should work");

        let mut payload = std::fs::read(&path).expect("reading saved scene should work");
        if !payload.is_empty() {
            let target = index % payload.len();
            payload[target] ^= delta.max(1);
        }
        std::fs::write(&path, payload).expect("writing mutated payload should work");

        prop_assert!(no_panic_load(&path));
    }
}
