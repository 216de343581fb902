use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

pub const DEFAULT_SIZE_LIMIT: u64 = 10 * 1024 * 1024 * 1024;
pub const DEFAULT_INCLUDE_FILE: &str = "to_include.txt";
pub const DEFAULT_EXCLUDE_FILE: &str = "to_exclude.txt";
pub const DEFAULT_FORCE_FILE: &str = "to_force.txt";

/// Settings file contents. Every field is optional; present fields override defaults and
/// are in turn overridden by command-line flags.
#[derive(Debug, Deserialize, Default, Clone, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct SettingsFile {
    pub home: Option<String>,
    pub destination: Option<String>,
    pub include_file: Option<PathBuf>,
    pub exclude_file: Option<PathBuf>,
    pub force_file: Option<PathBuf>,
    pub size_limit: Option<u64>,
    pub no_size_limit: Option<bool>,
    pub keep_hidden: Option<bool>,
    pub suppress_deletion: Option<bool>,
    pub overwrite_any_direction: Option<bool>,
    pub dialect: Option<String>,
    pub stop_if_warned: Option<bool>,
    pub pause_for_confirmation: Option<bool>,
    pub script_only: Option<bool>,
    pub keep_script: Option<bool>,
}

pub fn load_settings(path: &Path) -> Result<SettingsFile> {
    let data = fs::read(path).with_context(|| format!("reading settings {}", path.display()))?;
    if path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case("json"))
        .unwrap_or(false)
    {
        serde_json::from_slice(&data).with_context(|| format!("parsing {}", path.display()))
    } else {
        serde_yaml::from_slice(&data).with_context(|| format!("parsing {}", path.display()))
    }
}

/// Where the three input lists live.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListFiles {
    pub include: PathBuf,
    pub exclude: PathBuf,
    pub force: PathBuf,
}

impl Default for ListFiles {
    fn default() -> Self {
        Self {
            include: PathBuf::from(DEFAULT_INCLUDE_FILE),
            exclude: PathBuf::from(DEFAULT_EXCLUDE_FILE),
            force: PathBuf::from(DEFAULT_FORCE_FILE),
        }
    }
}

/// How the generated script is handled once a plan exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunOptions {
    pub stop_if_warned: bool,
    pub pause_for_confirmation: bool,
    pub script_only: bool,
    pub keep_script: bool,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            stop_if_warned: true,
            pause_for_confirmation: true,
            script_only: false,
            keep_script: false,
        }
    }
}

impl RunOptions {
    pub fn merge(mut self, settings: &SettingsFile) -> Self {
        if let Some(stop) = settings.stop_if_warned {
            self.stop_if_warned = stop;
        }
        if let Some(pause) = settings.pause_for_confirmation {
            self.pause_for_confirmation = pause;
        }
        if let Some(script_only) = settings.script_only {
            self.script_only = script_only;
        }
        if let Some(keep) = settings.keep_script {
            self.keep_script = keep;
        }
        self
    }
}
