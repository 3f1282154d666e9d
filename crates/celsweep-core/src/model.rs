use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const DEFAULT_FRAME_COUNT: u32 = 24;

pub type ElementId = u32;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Scene {
    pub id: Uuid,
    pub title: String,
    pub frame_count: u32,
    pub nodes: Vec<Node>,
    pub columns: BTreeMap<String, DrawingColumn>,
    pub elements: BTreeMap<ElementId, Element>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Scene {
    #[must_use]
    pub fn new(title: impl Into<String>, frame_count: u32) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            title: title.into(),
            frame_count,
            nodes: Vec::new(),
            columns: BTreeMap::new(),
            elements: BTreeMap::new(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }

    #[must_use]
    pub fn node(&self, path: &str) -> Option<&Node> {
        self.nodes.iter().find(|node| node.path() == path)
    }

    #[must_use]
    pub fn drawing_paths(&self) -> Vec<String> {
        self.nodes
            .iter()
            .filter_map(|node| match node {
                Node::Drawing(drawing) => Some(drawing.path.clone()),
                Node::Group(_) | Node::Other { .. } => None,
            })
            .collect()
    }

    #[must_use]
    pub fn drawing_count(&self) -> usize {
        self.nodes
            .iter()
            .filter(|node| matches!(node, Node::Drawing(_)))
            .count()
    }

    #[must_use]
    pub fn stored_cel_count(&self) -> usize {
        self.elements
            .values()
            .map(|element| element.drawings.len())
            .sum()
    }

    /// Registers a new element above the highest id present. Returns `None`
    /// once that id is `ElementId::MAX`.
    pub fn add_element(&mut self, name: impl Into<String>) -> Option<ElementId> {
        let id = match self.elements.keys().next_back() {
            Some(last) => last.checked_add(1)?,
            None => 1,
        };
        self.elements.insert(id, Element::new(id, name));
        Some(id)
    }

    pub fn add_cel(&mut self, element_id: ElementId, cel: impl Into<String>) {
        if let Some(element) = self.elements.get_mut(&element_id) {
            let cel = cel.into();
            if !element.drawings.contains(&cel) {
                element.drawings.push(cel);
            }
        }
    }

    pub fn add_column(&mut self, name: impl Into<String>, element_id: Option<ElementId>) {
        let name = name.into();
        self.columns
            .insert(name.clone(), DrawingColumn::new(name, element_id));
    }

    pub fn expose_sequence(&mut self, column: &str, cels: &[&str]) {
        if let Some(column) = self.columns.get_mut(column) {
            for (frame, cel) in (1_u32..).zip(cels) {
                if cel.is_empty() {
                    column.entries.remove(&frame);
                } else {
                    column.entries.insert(frame, (*cel).to_string());
                }
            }
        }
    }

    pub fn add_drawing_node(
        &mut self,
        path: impl Into<String>,
        addressing: ColumnAddressing,
        column: impl Into<String>,
    ) {
        let column = column.into();
        let mut drawing = DrawingNode::new(path, addressing);
        match addressing {
            ColumnAddressing::Element => drawing.element_column = Some(column),
            ColumnAddressing::CustomName => drawing.timing_column = Some(column),
        }
        self.nodes.push(Node::Drawing(drawing));
    }

    pub fn add_group(&mut self, path: impl Into<String>, children: &[&str]) {
        self.nodes.push(Node::Group(GroupNode {
            path: path.into(),
            children: children.iter().map(ToString::to_string).collect(),
        }));
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum ColumnAddressing {
    #[default]
    Element,
    CustomName,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Node {
    Drawing(DrawingNode),
    Group(GroupNode),
    Other { path: String },
}

impl Node {
    #[must_use]
    pub fn path(&self) -> &str {
        match self {
            Self::Drawing(drawing) => &drawing.path,
            Self::Group(group) => &group.path,
            Self::Other { path } => path,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DrawingNode {
    pub path: String,
    #[serde(default)]
    pub addressing: ColumnAddressing,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub element_column: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timing_column: Option<String>,
}

impl DrawingNode {
    #[must_use]
    pub fn new(path: impl Into<String>, addressing: ColumnAddressing) -> Self {
        Self {
            path: path.into(),
            addressing,
            element_column: None,
            timing_column: None,
        }
    }

    #[must_use]
    pub fn linked_column(&self, addressing: ColumnAddressing) -> Option<&str> {
        match addressing {
            ColumnAddressing::Element => self.element_column.as_deref(),
            ColumnAddressing::CustomName => self.timing_column.as_deref(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GroupNode {
    pub path: String,
    pub children: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DrawingColumn {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub element_id: Option<ElementId>,
    #[serde(default)]
    pub entries: BTreeMap<u32, String>,
}

impl DrawingColumn {
    #[must_use]
    pub fn new(name: impl Into<String>, element_id: Option<ElementId>) -> Self {
        Self {
            name: name.into(),
            element_id,
            entries: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn entry(&self, frame: u32) -> Option<&str> {
        self.entries.get(&frame).map(String::as_str)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Element {
    pub id: ElementId,
    pub name: String,
    pub drawings: Vec<String>,
}

impl Element {
    #[must_use]
    pub fn new(id: ElementId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            drawings: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn element_ids_are_allocated_in_order() {
        let mut scene = Scene::new("ids", DEFAULT_FRAME_COUNT);
        assert_eq!(scene.add_element("A"), Some(1));
        assert_eq!(scene.add_element("B"), Some(2));
    }

    #[test]
    fn element_id_space_exhaustion_keeps_existing_element() {
        let mut scene = Scene::new("ids", DEFAULT_FRAME_COUNT);
        scene
            .elements
            .insert(ElementId::MAX, Element::new(ElementId::MAX, "Last"));

        assert_eq!(scene.add_element("Overflow"), None);
        assert_eq!(scene.elements.len(), 1);
        assert_eq!(scene.elements[&ElementId::MAX].name, "Last");
    }

    #[test]
    fn expose_sequence_skips_blank_frames() {
        let mut scene = Scene::new("expose", 4);
        let element = scene.add_element("A").expect("element id should be available");
        scene.add_column("A", Some(element));
        scene.expose_sequence("A", &["1", "", "2"]);

        let column = &scene.columns["A"];
        assert_eq!(column.entry(1), Some("1"));
        assert_eq!(column.entry(2), None);
        assert_eq!(column.entry(3), Some("2"));
    }

    #[test]
    fn drawing_node_resolves_column_by_addressing() {
        let mut drawing = DrawingNode::new("Top/A", ColumnAddressing::Element);
        drawing.element_column = Some("A".to_string());
        drawing.timing_column = Some("A_timing".to_string());

        assert_eq!(drawing.linked_column(ColumnAddressing::Element), Some("A"));
        assert_eq!(
            drawing.linked_column(ColumnAddressing::CustomName),
            Some("A_timing")
        );
    }
}
