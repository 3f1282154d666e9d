use std::collections::BTreeMap;

use tracing::{debug, info, instrument};

use crate::{
    host::{HostError, SceneHost, SceneNode},
    model::{ColumnAddressing, DrawingColumn, DrawingNode, Element, ElementId, Node, Scene},
};

#[derive(Debug, Clone)]
struct UndoEntry {
    label: String,
    columns: BTreeMap<String, DrawingColumn>,
    elements: BTreeMap<ElementId, Element>,
}

/// `SceneHost` backed by an owned `Scene`, with an undo stack of whole
/// storage snapshots.
#[derive(Debug, Clone)]
pub struct MemoryScene {
    scene: Scene,
    open_transaction: Option<UndoEntry>,
    undo_stack: Vec<UndoEntry>,
}

impl MemoryScene {
    #[must_use]
    pub fn new(scene: Scene) -> Self {
        Self {
            scene,
            open_transaction: None,
            undo_stack: Vec::new(),
        }
    }

    #[must_use]
    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    #[must_use]
    pub fn into_scene(self) -> Scene {
        self.scene
    }

    #[must_use]
    pub fn undo_depth(&self) -> usize {
        self.undo_stack.len()
    }

    #[must_use]
    pub fn undo_labels(&self) -> Vec<&str> {
        self.undo_stack
            .iter()
            .map(|entry| entry.label.as_str())
            .collect()
    }

    /// Reverts the most recent closed transaction. Returns its label.
    #[instrument(skip(self), fields(scene_id = %self.scene.id))]
    pub fn undo(&mut self) -> Option<String> {
        let entry = self.undo_stack.pop()?;
        self.scene.columns = entry.columns;
        self.scene.elements = entry.elements;
        self.scene.touch();
        info!(label = %entry.label, "undo applied");
        Some(entry.label)
    }

    fn column(&self, name: &str) -> Result<&DrawingColumn, HostError> {
        self.scene
            .columns
            .get(name)
            .ok_or_else(|| HostError::ColumnNotFound(name.to_string()))
    }

    fn column_mut(&mut self, name: &str) -> Result<&mut DrawingColumn, HostError> {
        self.scene
            .columns
            .get_mut(name)
            .ok_or_else(|| HostError::ColumnNotFound(name.to_string()))
    }

    fn check_frame(&self, frame: u32) -> Result<(), HostError> {
        if frame == 0 || frame > self.scene.frame_count {
            return Err(HostError::FrameOutOfRange {
                frame,
                frame_count: self.scene.frame_count,
            });
        }
        Ok(())
    }

    fn drawing(&self, path: &str) -> Result<&DrawingNode, HostError> {
        match self.scene.node(path) {
            Some(Node::Drawing(drawing)) => Ok(drawing),
            Some(_) => Err(HostError::NotADrawing(path.to_string())),
            None => Err(HostError::NodeNotFound(path.to_string())),
        }
    }
}

impl SceneHost for MemoryScene {
    fn frame_count(&self) -> u32 {
        self.scene.frame_count
    }

    fn node(&self, path: &str) -> Result<SceneNode, HostError> {
        match self.scene.node(path) {
            Some(Node::Drawing(_)) => Ok(SceneNode::Drawing),
            Some(Node::Group(group)) => Ok(SceneNode::Group(group.children.clone())),
            Some(Node::Other { .. }) => Ok(SceneNode::Other),
            None => Err(HostError::NodeNotFound(path.to_string())),
        }
    }

    fn drawing_nodes(&self) -> Vec<String> {
        self.scene.drawing_paths()
    }

    fn addressing(&self, node: &str) -> Result<ColumnAddressing, HostError> {
        Ok(self.drawing(node)?.addressing)
    }

    fn linked_column(
        &self,
        node: &str,
        addressing: ColumnAddressing,
    ) -> Result<String, HostError> {
        self.drawing(node)?
            .linked_column(addressing)
            .map(ToString::to_string)
            .ok_or_else(|| HostError::ColumnUnlinked {
                node: node.to_string(),
                addressing,
            })
    }

    fn element_id(&self, column: &str) -> Result<ElementId, HostError> {
        self.column(column)?
            .element_id
            .ok_or_else(|| HostError::ElementUnresolved(column.to_string()))
    }

    fn entry(&self, column: &str, frame: u32) -> Result<Option<String>, HostError> {
        self.check_frame(frame)?;
        Ok(self.column(column)?.entry(frame).map(ToString::to_string))
    }

    fn drawing_timings(&self, column: &str) -> Result<Vec<String>, HostError> {
        let element_id = self.element_id(column)?;
        Ok(self
            .scene
            .elements
            .get(&element_id)
            .map(|element| element.drawings.clone())
            .unwrap_or_default())
    }

    fn set_entry(
        &mut self,
        column: &str,
        frame: u32,
        cel: Option<&str>,
    ) -> Result<(), HostError> {
        self.check_frame(frame)?;
        let column = self.column_mut(column)?;
        match cel.filter(|cel| !cel.is_empty()) {
            Some(cel) => {
                column.entries.insert(frame, cel.to_string());
            }
            None => {
                column.entries.remove(&frame);
            }
        }
        Ok(())
    }

    #[instrument(skip(self), fields(scene_id = %self.scene.id))]
    fn delete_drawing_at(&mut self, column: &str, frame: u32) -> Result<(), HostError> {
        self.check_frame(frame)?;
        let target = self.column(column)?;
        let cel = target
            .entry(frame)
            .map(ToString::to_string)
            .ok_or_else(|| HostError::NoDrawingAt {
                column: column.to_string(),
                frame,
            })?;
        let element_id = target
            .element_id
            .ok_or_else(|| HostError::ElementUnresolved(column.to_string()))?;

        if let Some(element) = self.scene.elements.get_mut(&element_id) {
            element.drawings.retain(|stored| *stored != cel);
        }
        for bound in self
            .scene
            .columns
            .values_mut()
            .filter(|bound| bound.element_id == Some(element_id))
        {
            bound.entries.retain(|_, exposed| *exposed != cel);
        }
        self.scene.touch();
        debug!(%cel, element_id, "drawing deleted from storage");
        Ok(())
    }

    #[instrument(skip(self), fields(scene_id = %self.scene.id))]
    fn begin_undo(&mut self, label: &str) -> Result<(), HostError> {
        if let Some(open) = &self.open_transaction {
            return Err(HostError::Transaction(format!(
                "transaction already open: {}",
                open.label
            )));
        }
        self.open_transaction = Some(UndoEntry {
            label: label.to_string(),
            columns: self.scene.columns.clone(),
            elements: self.scene.elements.clone(),
        });
        debug!("undo accumulation started");
        Ok(())
    }

    #[instrument(skip(self), fields(scene_id = %self.scene.id))]
    fn end_undo(&mut self) -> Result<(), HostError> {
        let entry = self
            .open_transaction
            .take()
            .ok_or_else(|| HostError::Transaction("no transaction open".to_string()))?;
        info!(label = %entry.label, "undo accumulation closed");
        self.undo_stack.push(entry);
        Ok(())
    }
}
