use std::{fs, io::ErrorKind, path::Path, path::PathBuf};

use anyhow::Context;
use mvu::DEFAULT_MAX_MEMORY;
use serde::Deserialize;
use tracing::{debug, warn};

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    pub bind_addr: String,
    /// Ceiling for one submitted form, uploads included.
    pub max_memory: u64,
    /// Load templates from this directory instead of the embedded copies.
    pub template_dir: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:8080".into(),
            max_memory: DEFAULT_MAX_MEMORY,
            template_dir: None,
        }
    }
}

/// Defaults, overlaid by the config file at `path` when it exists, overlaid by
/// the process environment.
pub fn load_settings(path: &Path) -> anyhow::Result<Settings> {
    let settings = read_file(path)?;
    Ok(apply_env(settings, |key| std::env::var(key).ok()))
}

fn read_file(path: &Path) -> anyhow::Result<Settings> {
    let raw = match fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(err) if err.kind() == ErrorKind::NotFound => {
            debug!(path = %path.display(), "no config file, using defaults");
            return Ok(Settings::default());
        }
        Err(err) => {
            return Err(err).with_context(|| format!("failed to read '{}'", path.display()))
        }
    };

    toml::from_str(&raw).with_context(|| format!("invalid config file '{}'", path.display()))
}

pub(crate) fn apply_env<F>(mut settings: Settings, var: F) -> Settings
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(v) = var("COUNTER_BIND") {
        settings.bind_addr = v;
    }
    if let Some(v) = var("APP__BIND_ADDR") {
        settings.bind_addr = v;
    }

    if let Some(v) = var("APP__MAX_MEMORY") {
        match v.parse::<u64>() {
            Ok(parsed) => settings.max_memory = parsed,
            Err(error) => warn!(value = %v, %error, "ignoring invalid APP__MAX_MEMORY"),
        }
    }

    if let Some(v) = var("APP__TEMPLATE_DIR") {
        settings.template_dir = (!v.is_empty()).then(|| PathBuf::from(v));
    }

    settings
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
