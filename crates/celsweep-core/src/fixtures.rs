use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::model::{ColumnAddressing, Node, Scene};

/// Shared columns, a custom-name node and nodes outside the character group.
#[must_use]
pub fn demo_scene() -> Scene {
    let mut scene = Scene::new("Celsweep Demo", 6);
    scene.id = Uuid::parse_str("5c1f6a52-8d0e-4c57-9a3c-2f1f4b1de0a7")
        .expect("fixture scene id should be valid");
    let fixed_timestamp = DateTime::parse_from_rfc3339("2026-02-23T00:00:00Z")
        .expect("fixture timestamp should be valid")
        .with_timezone(&Utc);
    scene.created_at = fixed_timestamp;
    scene.updated_at = fixed_timestamp;

    let body = scene.add_element("Body").expect("element id should be available");
    for cel in ["1", "2", "3", "4"] {
        scene.add_cel(body, cel);
    }
    scene.add_column("Body", Some(body));
    scene.expose_sequence("Body", &["1", "1", "2", "1", "2", "2"]);

    let head = scene.add_element("Head").expect("element id should be available");
    for cel in ["a", "b", "c", "d"] {
        scene.add_cel(head, cel);
    }
    scene.add_column("Head", Some(head));
    scene.expose_sequence("Head", &["a", "a", "", "", "a", "a"]);
    scene.add_column("Head_alt", Some(head));
    scene.expose_sequence("Head_alt", &["", "", "c", "c", "", ""]);

    let bg = scene.add_element("BG").expect("element id should be available");
    for cel in ["day", "night", "dusk"] {
        scene.add_cel(bg, cel);
    }
    scene.add_column("BG", Some(bg));
    scene.expose_sequence("BG", &["day", "day", "day", "day", "day", "day"]);

    scene.add_group(
        "Top/Characters",
        &[
            "Top/Characters/Body",
            "Top/Characters/Body_Dup",
            "Top/Characters/Head",
            "Top/Characters/Head_Alt",
        ],
    );
    scene.add_drawing_node("Top/Characters/Body", ColumnAddressing::Element, "Body");
    scene.add_drawing_node("Top/Characters/Body_Dup", ColumnAddressing::Element, "Body");
    scene.add_drawing_node("Top/Characters/Head", ColumnAddressing::Element, "Head");
    scene.add_drawing_node(
        "Top/Characters/Head_Alt",
        ColumnAddressing::CustomName,
        "Head_alt",
    );
    scene.add_drawing_node("Top/BG", ColumnAddressing::Element, "BG");
    scene.nodes.push(Node::Other {
        path: "Top/Peg".to_string(),
    });

    scene
}
