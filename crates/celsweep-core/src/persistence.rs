use std::{
    fs,
    io::Write,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use chrono::Utc;
use tracing::{debug, info, instrument};

use crate::model::Scene;

#[instrument(skip(scene), fields(scene_id = %scene.id, path = %path.display()))]
pub fn save_scene(path: &Path, scene: &Scene) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create directory: {}", parent.display()))?;
    }

    let json = serde_json::to_vec_pretty(scene).context("failed to serialize scene")?;
    let mut temp_file = tempfile::NamedTempFile::new_in(
        path.parent()
            .filter(|parent| !parent.as_os_str().is_empty())
            .map_or_else(|| Path::new(".").to_path_buf(), Path::to_path_buf),
    )
    .context("failed to create temp scene file")?;

    temp_file
        .write_all(&json)
        .context("failed to write temp scene file")?;
    temp_file
        .persist(path)
        .map_err(|error| anyhow::anyhow!(error.error))
        .with_context(|| format!("failed to persist scene: {}", path.display()))?;

    info!("scene saved");
    Ok(())
}

#[instrument(fields(path = %path.display()))]
pub fn load_scene(path: &Path) -> Result<Scene> {
    let content =
        fs::read(path).with_context(|| format!("failed to read scene: {}", path.display()))?;
    let scene: Scene = serde_json::from_slice(&content).context("invalid scene json")?;
    info!(scene_id = %scene.id, "scene loaded");
    Ok(scene)
}

/// Copies the scene file next to itself with a timestamp suffix before it is
/// rewritten in place.
#[instrument(fields(path = %path.display()))]
pub fn backup_scene(path: &Path) -> Result<PathBuf> {
    let file_name = path
        .file_name()
        .with_context(|| format!("scene path has no file name: {}", path.display()))?
        .to_string_lossy();
    let timestamp = Utc::now().format("%Y%m%d-%H%M%S");
    let backup_path = path.with_file_name(format!("{file_name}.{timestamp}.bak"));

    fs::copy(path, &backup_path).with_context(|| {
        format!(
            "failed to back up {} to {}",
            path.display(),
            backup_path.display()
        )
    })?;

    debug!(backup = %backup_path.display(), "scene backed up");
    Ok(backup_path)
}
