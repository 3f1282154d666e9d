use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, error, info, instrument};

use crate::{
    host::{HostError, SceneHost},
    model::ElementId,
    share::AssetGroup,
};

#[derive(Debug, Error)]
pub enum ReduceError {
    #[error("element {0} has no bindings")]
    EmptyGroup(ElementId),
    #[error(transparent)]
    Host(#[from] HostError),
    #[error("element {element_id} cleanup stopped after deleting {deleted:?}: {source}")]
    Interrupted {
        element_id: ElementId,
        deleted: Vec<String>,
        #[source]
        source: HostError,
    },
}

impl ReduceError {
    /// Cels already gone from storage when the error was raised.
    #[must_use]
    pub fn deleted(&self) -> &[String] {
        match self {
            Self::Interrupted { deleted, .. } => deleted,
            Self::EmptyGroup(_) | Self::Host(_) => &[],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DeletionPlan {
    pub element_id: ElementId,
    pub column: String,
    pub exposed: Vec<String>,
    pub victims: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ReduceOutcome {
    pub element_id: ElementId,
    pub column: String,
    pub exposed: Vec<String>,
    pub deleted: Vec<String>,
    pub restored_last_cel: Option<String>,
}

/// Every non-blank cel referenced in frames `1..=last_frame` by any active
/// binding of the group, in order of first appearance.
pub fn exposed_cels<H>(
    host: &H,
    group: &AssetGroup,
    last_frame: u32,
) -> Result<Vec<String>, HostError>
where
    H: SceneHost + ?Sized,
{
    scan_exposure(host, group, last_frame).map(|(exposed, _)| exposed)
}

#[instrument(skip(host, group), fields(element_id = group.element_id))]
fn scan_exposure<H>(
    host: &H,
    group: &AssetGroup,
    last_frame: u32,
) -> Result<(Vec<String>, BTreeSet<String>), HostError>
where
    H: SceneHost + ?Sized,
{
    let mut exposed = Vec::new();
    let mut seen = BTreeSet::new();

    for binding in group.active_bindings() {
        for frame in 1..=last_frame {
            let Some(cel) = host.entry(&binding.column, frame)? else {
                continue;
            };
            if cel.is_empty() || seen.contains(&cel) {
                continue;
            }
            seen.insert(cel.clone());
            exposed.push(cel);
        }
    }

    debug!(exposed = exposed.len(), "exposure scan complete");
    Ok((exposed, seen))
}

#[instrument(skip(host, group), fields(element_id = group.element_id))]
pub fn plan_deletions<H>(
    host: &H,
    group: &AssetGroup,
    last_frame: u32,
) -> Result<DeletionPlan, ReduceError>
where
    H: SceneHost + ?Sized,
{
    let column = group
        .primary_column()
        .ok_or(ReduceError::EmptyGroup(group.element_id))?
        .to_string();
    let (exposed, seen) = scan_exposure(host, group, last_frame)?;
    let victims = host
        .drawing_timings(&column)?
        .into_iter()
        .filter(|cel| !seen.contains(cel))
        .collect();

    Ok(DeletionPlan {
        element_id: group.element_id,
        column,
        exposed,
        victims,
    })
}

/// Deletes the plan's victims through the last frame of its column, then
/// restores that frame. Once the guard holds the frame, a host error comes
/// back as `ReduceError::Interrupted` listing the cels already deleted.
#[instrument(skip(host, plan), fields(element_id = plan.element_id, column = %plan.column, victims = plan.victims.len()))]
pub fn apply_plan<H>(
    host: &mut H,
    plan: &DeletionPlan,
    last_frame: u32,
) -> Result<ReduceOutcome, ReduceError>
where
    H: SceneHost + ?Sized,
{
    let mut guard = LastFrameGuard::acquire(host, &plan.column, last_frame)?;
    let mut deleted = Vec::with_capacity(plan.victims.len());
    let interrupted = |deleted: Vec<String>, source| ReduceError::Interrupted {
        element_id: plan.element_id,
        deleted,
        source,
    };
    for victim in &plan.victims {
        if let Err(source) = guard.purge(victim) {
            return Err(interrupted(deleted, source));
        }
        deleted.push(victim.clone());
    }
    let restored_last_cel = match guard.release() {
        Ok(cel) => cel,
        Err(source) => return Err(interrupted(deleted, source)),
    };

    if deleted.is_empty() {
        debug!("nothing to delete");
    } else {
        info!(deleted = deleted.len(), "unexposed cels deleted");
    }

    Ok(ReduceOutcome {
        element_id: plan.element_id,
        column: plan.column.clone(),
        exposed: plan.exposed.clone(),
        deleted,
        restored_last_cel,
    })
}

pub fn reduce<H>(
    host: &mut H,
    group: &AssetGroup,
    last_frame: u32,
) -> Result<ReduceOutcome, ReduceError>
where
    H: SceneHost + ?Sized,
{
    let plan = plan_deletions(&*host, group, last_frame)?;
    apply_plan(host, &plan, last_frame)
}

/// Holds the original content of a column's last frame while cels are rotated
/// through it. Dropping the guard without `release` still writes the original
/// back.
struct LastFrameGuard<'h, H: SceneHost + ?Sized> {
    host: &'h mut H,
    column: String,
    frame: u32,
    original: Option<String>,
    armed: bool,
}

impl<'h, H: SceneHost + ?Sized> LastFrameGuard<'h, H> {
    fn acquire(host: &'h mut H, column: &str, frame: u32) -> Result<Self, HostError> {
        let original = host.entry(column, frame)?;
        Ok(Self {
            host,
            column: column.to_string(),
            frame,
            original,
            armed: true,
        })
    }

    fn purge(&mut self, cel: &str) -> Result<(), HostError> {
        self.host.set_entry(&self.column, self.frame, Some(cel))?;
        self.host.delete_drawing_at(&self.column, self.frame)?;
        debug!(%cel, "cel deleted");
        Ok(())
    }

    // On failure the guard stays armed and retries from drop.
    fn release(mut self) -> Result<Option<String>, HostError> {
        self.host
            .set_entry(&self.column, self.frame, self.original.as_deref())?;
        self.armed = false;
        Ok(self.original.take())
    }
}

impl<H: SceneHost + ?Sized> Drop for LastFrameGuard<'_, H> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        if let Err(restore_error) =
            self.host
                .set_entry(&self.column, self.frame, self.original.as_deref())
        {
            error!(
                column = %self.column,
                frame = self.frame,
                %restore_error,
                "failed to restore last frame"
            );
        }
    }
}
