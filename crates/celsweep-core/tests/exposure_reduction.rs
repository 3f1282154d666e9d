mod common;

use celsweep_core::{
    AssetGroup, ColumnAddressing, DeletionPlan, HostError, MemoryScene, ReduceError, Scene,
    SceneHost, TrackBinding, apply_plan, reduce,
};
use common::FlakyHost;

fn column_scene(frames: &[&str], stored: &[&str]) -> MemoryScene {
    let frame_count = u32::try_from(frames.len()).expect("frame count should fit u32");
    let mut scene = Scene::new("Exposure", frame_count);
    let element = scene.add_element("A").expect("element id should be available");
    for cel in stored {
        scene.add_cel(element, *cel);
    }
    scene.add_column("A", Some(element));
    scene.expose_sequence("A", frames);
    scene.add_drawing_node("Top/A", ColumnAddressing::Element, "A");
    MemoryScene::new(scene)
}

fn group_for(host: &impl SceneHost, nodes: &[(&str, &str)]) -> AssetGroup {
    AssetGroup {
        element_id: host
            .element_id(nodes[0].1)
            .expect("fixture column should have an element"),
        bindings: nodes
            .iter()
            .map(|(node, column)| TrackBinding {
                node: (*node).to_string(),
                column: (*column).to_string(),
                excluded: false,
            })
            .collect(),
    }
}

fn frames(host: &impl SceneHost, column: &str) -> Vec<Option<String>> {
    (1..=host.frame_count())
        .map(|frame| host.entry(column, frame).expect("frame should be readable"))
        .collect()
}

#[test]
fn unexposed_cel_is_deleted_and_last_frame_kept() {
    let mut host = column_scene(&["c1", "c1", "c2", "c1", "c2"], &["c1", "c2", "c3"]);
    let group = group_for(&host, &[("Top/A", "A")]);
    let before = frames(&host, "A");

    let outcome = reduce(&mut host, &group, 5).expect("reduce should succeed");

    assert_eq!(outcome.exposed, ["c1", "c2"]);
    assert_eq!(outcome.deleted, ["c3"]);
    assert_eq!(outcome.restored_last_cel.as_deref(), Some("c2"));
    assert_eq!(host.drawing_timings("A").expect("timings"), ["c1", "c2"]);
    assert_eq!(frames(&host, "A"), before);
}

#[test]
fn blank_track_loses_every_cel_but_keeps_last_frame_value() {
    let mut host = column_scene(&["", "", ""], &["c1", "c2"]);
    let group = group_for(&host, &[("Top/A", "A")]);

    let outcome = reduce(&mut host, &group, 3).expect("reduce should succeed");

    assert!(outcome.exposed.is_empty());
    assert_eq!(outcome.deleted, ["c1", "c2"]);
    assert_eq!(outcome.restored_last_cel, None);
    assert!(host.drawing_timings("A").expect("timings").is_empty());
    assert_eq!(host.entry("A", 3).expect("entry"), None);
}

#[test]
fn last_frame_is_restored_even_when_its_cel_was_purged() {
    let mut host = column_scene(&["c1", "c2"], &["c1", "c2"]);
    let plan = DeletionPlan {
        element_id: host.element_id("A").expect("element"),
        column: "A".to_string(),
        exposed: Vec::new(),
        victims: vec!["c2".to_string()],
    };

    let outcome = apply_plan(&mut host, &plan, 2).expect("apply should succeed");

    assert_eq!(outcome.deleted, ["c2"]);
    assert_eq!(host.drawing_timings("A").expect("timings"), ["c1"]);
    assert_eq!(host.entry("A", 2).expect("entry").as_deref(), Some("c2"));
}

#[test]
fn single_frame_timeline_rotates_through_frame_one() {
    let mut host = column_scene(&["c2"], &["c1", "c2", "c3"]);
    let group = group_for(&host, &[("Top/A", "A")]);

    let outcome = reduce(&mut host, &group, 1).expect("reduce should succeed");

    assert_eq!(outcome.deleted, ["c1", "c3"]);
    assert_eq!(host.drawing_timings("A").expect("timings"), ["c2"]);
    assert_eq!(host.entry("A", 1).expect("entry").as_deref(), Some("c2"));
}

#[test]
fn empty_storage_is_a_noop() {
    let mut host = column_scene(&["", "c1"], &[]);
    let group = group_for(&host, &[("Top/A", "A")]);

    let outcome = reduce(&mut host, &group, 2).expect("reduce should succeed");

    assert!(outcome.deleted.is_empty());
    assert_eq!(host.entry("A", 2).expect("entry").as_deref(), Some("c1"));
}

#[test]
fn cels_exposed_only_in_a_sibling_column_survive() {
    let mut scene = Scene::new("Siblings", 4);
    let element = scene.add_element("Head").expect("element id should be available");
    for cel in ["a", "b", "c"] {
        scene.add_cel(element, cel);
    }
    scene.add_column("Head", Some(element));
    scene.add_column("Head_alt", Some(element));
    scene.expose_sequence("Head", &["a", "a", "", "a"]);
    scene.expose_sequence("Head_alt", &["", "c", "c", ""]);
    let mut host = MemoryScene::new(scene);
    let group = group_for(&host, &[("Top/Head", "Head"), ("Top/Head_Alt", "Head_alt")]);

    let outcome = reduce(&mut host, &group, 4).expect("reduce should succeed");

    assert_eq!(outcome.exposed, ["a", "c"]);
    assert_eq!(outcome.deleted, ["b"]);
    assert_eq!(host.drawing_timings("Head").expect("timings"), ["a", "c"]);
    assert_eq!(host.entry("Head_alt", 2).expect("entry").as_deref(), Some("c"));
}

#[test]
fn host_failure_mid_deletion_restores_last_frame() {
    let inner = column_scene(&["c1", "c1", "c1"], &["c1", "c2", "c3", "c4"]);
    let mut host = FlakyHost::new(inner);
    host.fail_delete_of = Some("c3".to_string());
    let group = group_for(&host, &[("Top/A", "A")]);

    let error = reduce(&mut host, &group, 3).expect_err("reduce should fail on c3");

    assert!(matches!(
        &error,
        ReduceError::Interrupted { deleted, source: HostError::Rejected(_), .. } if deleted == &["c2"]
    ));
    assert_eq!(error.deleted(), ["c2"]);
    assert_eq!(host.entry("A", 3).expect("entry").as_deref(), Some("c1"));
    assert_eq!(
        host.drawing_timings("A").expect("timings"),
        ["c1", "c3", "c4"]
    );
    assert_eq!(host.deletes, 1);
}
