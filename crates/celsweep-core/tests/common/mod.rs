#![allow(dead_code)]

use std::cell::Cell;

use celsweep_core::{
    ColumnAddressing, ElementId, HostError, MemoryScene, SceneHost, SceneNode,
};

/// Wraps a `MemoryScene`, counting storage calls and failing on demand.
pub struct FlakyHost {
    pub inner: MemoryScene,
    pub fail_delete_of: Option<String>,
    pub fail_begin_undo: bool,
    pub entry_reads: Cell<usize>,
    pub deletes: usize,
}

impl FlakyHost {
    pub fn new(inner: MemoryScene) -> Self {
        Self {
            inner,
            fail_delete_of: None,
            fail_begin_undo: false,
            entry_reads: Cell::new(0),
            deletes: 0,
        }
    }
}

impl SceneHost for FlakyHost {
    fn frame_count(&self) -> u32 {
        self.inner.frame_count()
    }

    fn node(&self, path: &str) -> Result<SceneNode, HostError> {
        self.inner.node(path)
    }

    fn drawing_nodes(&self) -> Vec<String> {
        self.inner.drawing_nodes()
    }

    fn addressing(&self, node: &str) -> Result<ColumnAddressing, HostError> {
        self.inner.addressing(node)
    }

    fn linked_column(
        &self,
        node: &str,
        addressing: ColumnAddressing,
    ) -> Result<String, HostError> {
        self.inner.linked_column(node, addressing)
    }

    fn element_id(&self, column: &str) -> Result<ElementId, HostError> {
        self.inner.element_id(column)
    }

    fn entry(&self, column: &str, frame: u32) -> Result<Option<String>, HostError> {
        self.entry_reads.set(self.entry_reads.get() + 1);
        self.inner.entry(column, frame)
    }

    fn drawing_timings(&self, column: &str) -> Result<Vec<String>, HostError> {
        self.inner.drawing_timings(column)
    }

    fn set_entry(
        &mut self,
        column: &str,
        frame: u32,
        cel: Option<&str>,
    ) -> Result<(), HostError> {
        self.inner.set_entry(column, frame, cel)
    }

    fn delete_drawing_at(&mut self, column: &str, frame: u32) -> Result<(), HostError> {
        let current = self.inner.entry(column, frame)?;
        if current.is_some() && current == self.fail_delete_of {
            return Err(HostError::Rejected(format!(
                "refusing to delete {current:?}"
            )));
        }
        self.deletes += 1;
        self.inner.delete_drawing_at(column, frame)
    }

    fn begin_undo(&mut self, label: &str) -> Result<(), HostError> {
        if self.fail_begin_undo {
            return Err(HostError::Transaction("undo history unavailable".to_string()));
        }
        self.inner.begin_undo(label)
    }

    fn end_undo(&mut self) -> Result<(), HostError> {
        self.inner.end_undo()
    }
}
