use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, instrument, warn};

use crate::{
    exposure::{self, DeletionPlan, ReduceOutcome},
    host::{Confirmation, HostError, SceneHost, SceneNode},
    model::ElementId,
    share::{self, DuplicateColumnPolicy, ResolutionFailure},
};

pub const DEFAULT_UNDO_LABEL: &str = "Remove Unexposed Cels";

#[derive(Debug, Error)]
pub enum SweepError {
    #[error("selection contains no drawing nodes")]
    EmptySelection,
    #[error("scene timeline has no frames")]
    EmptyTimeline,
    #[error("could not open undo transaction: {0}")]
    UndoUnavailable(#[source] HostError),
    #[error("host error: {0}")]
    Host(#[from] HostError),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SweepOptions {
    pub skip_confirmation: bool,
    pub undo_label: String,
    pub duplicate_columns: DuplicateColumnPolicy,
}

impl Default for SweepOptions {
    fn default() -> Self {
        Self {
            skip_confirmation: false,
            undo_label: DEFAULT_UNDO_LABEL.to_string(),
            duplicate_columns: DuplicateColumnPolicy::default(),
        }
    }
}

/// An element whose cleanup stopped on a host error. Its last frame has
/// already been put back; `deleted` lists cels removed before the error.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GroupFailure {
    pub element_id: ElementId,
    #[serde(default)]
    pub deleted: Vec<String>,
    pub reason: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct SweepReport {
    pub drawing_count: usize,
    pub outcomes: Vec<ReduceOutcome>,
    pub resolution_failures: Vec<ResolutionFailure>,
    pub group_failures: Vec<GroupFailure>,
}

impl SweepReport {
    #[must_use]
    pub fn deleted_count(&self) -> usize {
        let completed: usize = self.outcomes.iter().map(|outcome| outcome.deleted.len()).sum();
        let interrupted: usize = self
            .group_failures
            .iter()
            .map(|failure| failure.deleted.len())
            .sum();
        completed + interrupted
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SweepOutcome {
    Aborted,
    Completed(SweepReport),
}

/// Drawing nodes reached from `selection`, depth-first, each listed once.
#[instrument(skip_all, fields(selected = selection.len()))]
pub fn expand_selection<H>(host: &H, selection: &[String]) -> Vec<String>
where
    H: SceneHost + ?Sized,
{
    let mut drawings = Vec::new();
    let mut visited = BTreeSet::new();
    let mut pending: Vec<String> = selection.iter().rev().cloned().collect();

    while let Some(path) = pending.pop() {
        if !visited.insert(path.clone()) {
            continue;
        }
        match host.node(&path) {
            Ok(SceneNode::Drawing) => drawings.push(path),
            Ok(SceneNode::Group(children)) => pending.extend(children.into_iter().rev()),
            Ok(SceneNode::Other) => debug!(%path, "ignoring non-drawing node"),
            Err(error) => warn!(%path, %error, "skipping unknown selection handle"),
        }
    }

    debug!(drawings = drawings.len(), "selection expanded");
    drawings
}

#[instrument(skip_all, fields(selected = selection.len()))]
pub fn plan_sweep<H>(
    host: &H,
    selection: &[String],
    policy: DuplicateColumnPolicy,
) -> Result<Vec<DeletionPlan>, SweepError>
where
    H: SceneHost + ?Sized,
{
    let drawings = expand_selection(host, selection);
    if drawings.is_empty() {
        return Err(SweepError::EmptySelection);
    }
    let last_frame = host.frame_count();
    if last_frame == 0 {
        return Err(SweepError::EmptyTimeline);
    }

    let resolution = share::resolve(host, &host.drawing_nodes(), &drawings, policy);
    let mut plans = Vec::with_capacity(resolution.groups.len());
    for group in &resolution.groups {
        match exposure::plan_deletions(host, group, last_frame) {
            Ok(plan) => plans.push(plan),
            Err(error) => warn!(element_id = group.element_id, %error, "element skipped"),
        }
    }
    Ok(plans)
}

/// Removes cels never exposed on the timeline from every element reachable
/// from `selection`, as one undo step.
#[instrument(skip_all, fields(selected = selection.len(), skip_confirmation = options.skip_confirmation))]
pub fn remove_unexposed_cels<H, C>(
    host: &mut H,
    selection: &[String],
    confirmation: &mut C,
    options: &SweepOptions,
) -> Result<SweepOutcome, SweepError>
where
    H: SceneHost + ?Sized,
    C: Confirmation + ?Sized,
{
    let drawings = expand_selection(&*host, selection);
    if drawings.is_empty() {
        return Err(SweepError::EmptySelection);
    }
    if !options.skip_confirmation && !confirmation.confirm(drawings.len()) {
        info!("sweep declined");
        return Ok(SweepOutcome::Aborted);
    }
    let last_frame = host.frame_count();
    if last_frame == 0 {
        return Err(SweepError::EmptyTimeline);
    }

    host.begin_undo(&options.undo_label)
        .map_err(SweepError::UndoUnavailable)?;

    let resolution = share::resolve(
        &*host,
        &host.drawing_nodes(),
        &drawings,
        options.duplicate_columns,
    );
    let mut report = SweepReport {
        drawing_count: drawings.len(),
        resolution_failures: resolution.failures,
        ..SweepReport::default()
    };

    for group in &resolution.groups {
        match exposure::reduce(host, group, last_frame) {
            Ok(outcome) => report.outcomes.push(outcome),
            Err(error) => {
                warn!(
                    element_id = group.element_id,
                    deleted = error.deleted().len(),
                    %error,
                    "element cleanup failed"
                );
                report.group_failures.push(GroupFailure {
                    element_id: group.element_id,
                    deleted: error.deleted().to_vec(),
                    reason: error.to_string(),
                });
            }
        }
    }

    host.end_undo()?;
    info!(
        elements = report.outcomes.len(),
        deleted = report.deleted_count(),
        failures = report.group_failures.len(),
        "sweep complete"
    );
    Ok(SweepOutcome::Completed(report))
}
