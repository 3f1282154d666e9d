use std::{
    env, fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{
    diagnostics::{DEFAULT_LOG_FILTER, DEFAULT_TRACE_FILE_PREFIX},
    share::DuplicateColumnPolicy,
    sweep::{DEFAULT_UNDO_LABEL, SweepOptions},
};

pub const CONFIG_FILE_NAME: &str = "celsweep.config.toml";
pub const CONFIG_PATH_ENV: &str = "CELSWEEP_CONFIG_PATH";

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SweepConfig {
    pub sweep: SweepSection,
    pub diagnostics: DiagnosticsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SweepSection {
    pub confirm: bool,
    pub undo_label: String,
    pub duplicate_columns: DuplicateColumnPolicy,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DiagnosticsConfig {
    pub rust_log_filter: String,
    pub trace_file_prefix: String,
    pub log_dir: PathBuf,
}

impl Default for SweepSection {
    fn default() -> Self {
        Self {
            confirm: true,
            undo_label: DEFAULT_UNDO_LABEL.to_string(),
            duplicate_columns: DuplicateColumnPolicy::default(),
        }
    }
}

impl Default for DiagnosticsConfig {
    fn default() -> Self {
        Self {
            rust_log_filter: DEFAULT_LOG_FILTER.to_string(),
            trace_file_prefix: DEFAULT_TRACE_FILE_PREFIX.to_string(),
            log_dir: PathBuf::from("logs"),
        }
    }
}

impl SweepConfig {
    /// Discovers the config file; a missing file yields the defaults. A file
    /// that exists and fails to parse is still an error.
    pub fn load_or_default() -> Result<Self> {
        match discover_config_path() {
            Ok(path) => Self::load_from(&path),
            Err(_) => {
                debug!("no config file found, using defaults");
                Ok(Self::default())
            }
        }
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        Self::parse(&content)
            .with_context(|| format!("failed to parse config TOML from {}", path.display()))
    }

    pub fn parse(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    #[must_use]
    pub fn sweep_options(&self, skip_confirmation: bool) -> SweepOptions {
        SweepOptions {
            skip_confirmation: skip_confirmation || !self.sweep.confirm,
            undo_label: self.sweep.undo_label.clone(),
            duplicate_columns: self.sweep.duplicate_columns,
        }
    }
}

fn discover_config_path() -> Result<PathBuf> {
    if let Some(path) = env::var_os(CONFIG_PATH_ENV) {
        let path = PathBuf::from(path);
        if path.is_file() {
            return Ok(path);
        }
    }

    let cwd = env::current_dir().context("failed to resolve current directory")?;
    let candidates = [
        cwd.join(CONFIG_FILE_NAME),
        cwd.join("..").join(CONFIG_FILE_NAME),
    ];

    candidates
        .into_iter()
        .find(|path| path.is_file())
        .ok_or_else(|| anyhow::anyhow!("{CONFIG_FILE_NAME} not found"))
}
