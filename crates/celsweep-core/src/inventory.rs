use std::{collections::BTreeSet, fs, path::Path};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::instrument;

use crate::model::Scene;

const INVENTORY_SCHEMA_VERSION: u32 = 1;

/// Counts and a storage fingerprint for a scene. Two scenes with equal
/// `storage_hash` have identical columns and cel storage.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct InventoryReport {
    pub schema_version: u32,
    pub scene_id: String,
    pub frame_count: u32,
    pub drawing_count: usize,
    pub column_count: usize,
    pub stored_cel_count: usize,
    pub exposed_cel_count: usize,
    pub unexposed_cel_count: usize,
    pub storage_hash: String,
}

#[instrument(skip(scene), fields(scene_id = %scene.id))]
pub fn generate_inventory_report(scene: &Scene) -> Result<InventoryReport> {
    let mut storage_bytes =
        serde_json::to_vec(&scene.columns).context("failed to serialize columns")?;
    storage_bytes
        .extend(serde_json::to_vec(&scene.elements).context("failed to serialize elements")?);

    let frame_count = scene.frame_count;
    let exposed: BTreeSet<(u32, &str)> = scene
        .columns
        .values()
        .filter_map(|column| column.element_id.map(|element_id| (element_id, column)))
        .flat_map(|(element_id, column)| {
            column
                .entries
                .iter()
                .filter(move |(frame, _)| (1..=frame_count).contains(*frame))
                .map(move |(_, cel)| (element_id, cel.as_str()))
        })
        .collect();
    let exposed_cel_count = scene
        .elements
        .values()
        .flat_map(|element| {
            element
                .drawings
                .iter()
                .map(move |cel| (element.id, cel.as_str()))
        })
        .filter(|stored| exposed.contains(stored))
        .count();
    let stored_cel_count = scene.stored_cel_count();

    Ok(InventoryReport {
        schema_version: INVENTORY_SCHEMA_VERSION,
        scene_id: scene.id.to_string(),
        frame_count: scene.frame_count,
        drawing_count: scene.drawing_count(),
        column_count: scene.columns.len(),
        stored_cel_count,
        exposed_cel_count,
        unexposed_cel_count: stored_cel_count - exposed_cel_count,
        storage_hash: hash_hex(&storage_bytes),
    })
}

pub fn write_inventory_report(path: &Path, report: &InventoryReport) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).with_context(|| {
            format!("failed to create inventory directory: {}", parent.display())
        })?;
    }

    let json = serde_json::to_vec_pretty(report).context("failed to encode inventory json")?;
    fs::write(path, json)
        .with_context(|| format!("failed to write inventory report: {}", path.display()))?;
    Ok(())
}

fn hash_hex(bytes: &[u8]) -> String {
    let digest = Sha256::digest(bytes);
    format!("{digest:x}")
}
