use thiserror::Error;

use crate::model::{ColumnAddressing, ElementId};

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum HostError {
    #[error("node not found: {0}")]
    NodeNotFound(String),
    #[error("node is not a drawing: {0}")]
    NotADrawing(String),
    #[error("column not found: {0}")]
    ColumnNotFound(String),
    #[error("node {node} has no linked {addressing:?} column")]
    ColumnUnlinked {
        node: String,
        addressing: ColumnAddressing,
    },
    #[error("column {0} is not bound to an element")]
    ElementUnresolved(String),
    #[error("frame {frame} outside 1..={frame_count}")]
    FrameOutOfRange { frame: u32, frame_count: u32 },
    #[error("no drawing exposed in column {column} at frame {frame}")]
    NoDrawingAt { column: String, frame: u32 },
    #[error("undo transaction: {0}")]
    Transaction(String),
    #[error("host rejected the call: {0}")]
    Rejected(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SceneNode {
    Drawing,
    Group(Vec<String>),
    Other,
}

/// Scene capabilities the cleanup consumes. Frames are 1-based and a blank
/// frame reads as `None`.
pub trait SceneHost {
    fn frame_count(&self) -> u32;

    fn node(&self, path: &str) -> Result<SceneNode, HostError>;

    fn drawing_nodes(&self) -> Vec<String>;

    fn addressing(&self, node: &str) -> Result<ColumnAddressing, HostError>;

    fn linked_column(&self, node: &str, addressing: ColumnAddressing)
    -> Result<String, HostError>;

    fn element_id(&self, column: &str) -> Result<ElementId, HostError>;

    fn entry(&self, column: &str, frame: u32) -> Result<Option<String>, HostError>;

    fn drawing_timings(&self, column: &str) -> Result<Vec<String>, HostError>;

    fn set_entry(&mut self, column: &str, frame: u32, cel: Option<&str>)
    -> Result<(), HostError>;

    /// Removes the cel currently exposed at `frame` from storage. Every frame
    /// referencing it, in any column of the element, goes blank.
    fn delete_drawing_at(&mut self, column: &str, frame: u32) -> Result<(), HostError>;

    fn begin_undo(&mut self, label: &str) -> Result<(), HostError>;

    fn end_undo(&mut self) -> Result<(), HostError>;
}

pub trait Confirmation {
    fn confirm(&mut self, drawing_count: usize) -> bool;
}

impl<F> Confirmation for F
where
    F: FnMut(usize) -> bool,
{
    fn confirm(&mut self, drawing_count: usize) -> bool {
        self(drawing_count)
    }
}
