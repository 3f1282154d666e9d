use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};

use crate::{
    host::{HostError, SceneHost},
    model::ElementId,
};

/// How duplicate columns inside one element group are detected.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum DuplicateColumnPolicy {
    /// Only compare each binding with the one right before it in scene order.
    /// A repeat separated by another column survives.
    #[default]
    Adjacent,
    /// Any column already seen earlier in the group is excluded.
    All,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TrackBinding {
    pub node: String,
    pub column: String,
    pub excluded: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AssetGroup {
    pub element_id: ElementId,
    pub bindings: Vec<TrackBinding>,
}

impl AssetGroup {
    pub fn active_bindings(&self) -> impl Iterator<Item = &TrackBinding> {
        self.bindings.iter().filter(|binding| !binding.excluded)
    }

    /// Column the deletions go through. The first binding is never excluded.
    #[must_use]
    pub fn primary_column(&self) -> Option<&str> {
        self.bindings.first().map(|binding| binding.column.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ResolutionFailure {
    pub node: String,
    pub reason: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ShareResolution {
    pub groups: Vec<AssetGroup>,
    pub failures: Vec<ResolutionFailure>,
}

#[instrument(skip_all, fields(scene_tracks = scene_tracks.len(), selected = selected.len(), policy = ?policy))]
pub fn resolve<H>(
    host: &H,
    scene_tracks: &[String],
    selected: &[String],
    policy: DuplicateColumnPolicy,
) -> ShareResolution
where
    H: SceneHost + ?Sized,
{
    let (groups, failures) = index_by_element(host, scene_tracks);
    let groups = retain_selected(groups, selected)
        .into_iter()
        .map(|group| exclude_duplicate_columns(group, policy))
        .collect::<Vec<_>>();

    debug!(
        groups = groups.len(),
        failures = failures.len(),
        "share resolution complete"
    );
    ShareResolution { groups, failures }
}

fn resolve_binding<H>(host: &H, node: &str) -> Result<(ElementId, String), HostError>
where
    H: SceneHost + ?Sized,
{
    let addressing = host.addressing(node)?;
    let column = host.linked_column(node, addressing)?;
    let element_id = host.element_id(&column)?;
    Ok((element_id, column))
}

fn index_by_element<H>(
    host: &H,
    scene_tracks: &[String],
) -> (Vec<AssetGroup>, Vec<ResolutionFailure>)
where
    H: SceneHost + ?Sized,
{
    let mut groups: Vec<AssetGroup> = Vec::new();
    let mut positions: BTreeMap<ElementId, usize> = BTreeMap::new();
    let mut failures = Vec::new();

    for node in scene_tracks {
        let (element_id, column) = match resolve_binding(host, node) {
            Ok(resolved) => resolved,
            Err(error) => {
                warn!(%node, %error, "skipping drawing with unresolved element");
                failures.push(ResolutionFailure {
                    node: node.clone(),
                    reason: error.to_string(),
                });
                continue;
            }
        };

        let binding = TrackBinding {
            node: node.clone(),
            column,
            excluded: false,
        };
        match positions.get(&element_id) {
            Some(&position) => groups[position].bindings.push(binding),
            None => {
                positions.insert(element_id, groups.len());
                groups.push(AssetGroup {
                    element_id,
                    bindings: vec![binding],
                });
            }
        }
    }

    (groups, failures)
}

fn retain_selected(groups: Vec<AssetGroup>, selected: &[String]) -> Vec<AssetGroup> {
    let selected: BTreeSet<&str> = selected.iter().map(String::as_str).collect();
    groups
        .into_iter()
        .filter(|group| {
            let touched = group
                .bindings
                .iter()
                .any(|binding| selected.contains(binding.node.as_str()));
            if !touched {
                debug!(
                    element_id = group.element_id,
                    "element not selected, left untouched"
                );
            }
            touched
        })
        .collect()
}

fn exclude_duplicate_columns(group: AssetGroup, policy: DuplicateColumnPolicy) -> AssetGroup {
    let AssetGroup {
        element_id,
        bindings,
    } = group;

    let mut seen: BTreeSet<String> = BTreeSet::new();
    let mut previous: Option<String> = None;
    let bindings = bindings
        .into_iter()
        .map(|binding| {
            let excluded = match policy {
                DuplicateColumnPolicy::Adjacent => {
                    previous.as_deref() == Some(binding.column.as_str())
                }
                DuplicateColumnPolicy::All => seen.contains(&binding.column),
            };
            previous = Some(binding.column.clone());
            seen.insert(binding.column.clone());
            if excluded {
                debug!(node = %binding.node, column = %binding.column, "column already covered");
            }
            TrackBinding { excluded, ..binding }
        })
        .collect();

    AssetGroup {
        element_id,
        bindings,
    }
}
