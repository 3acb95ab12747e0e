//! Manifest loading and validation.
//!
//! The manifest is a JSON document naming the service command and the files
//! to place on disk:
//!
//! ```json
//! {
//!   "command": "run.sh",
//!   "config_files": [
//!     {"source": "/src/app.conf", "dest": "/etc/app/", "owner": "app", "perm": "0640"}
//!   ]
//! }
//! ```
use std::path::Path;

use serde::Deserialize;
use serde_json::Value;

use super::{CONFIG_ENV, Settings};
use crate::error::{ConfigError, Result};

/// Keys every `config_files` entry must carry.
pub const REQUIRED_KEYS: [&str; 4] = ["source", "dest", "owner", "perm"];

/// Parsed manifest.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Manifest {
    /// Command line written to the command file after a copy pass.
    pub command: String,
    /// Ordered entries to copy or check; empty when the key is absent.
    #[serde(default)]
    pub config_files: Vec<ConfigFileSpec>,
}

/// One `config_files` entry as written in the manifest.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ConfigFileSpec {
    /// Glob pattern of source paths.
    pub source: String,
    /// Destination path; a trailing `/` means "into this directory".
    pub dest: String,
    /// User (and expected group) owning the installed files.
    pub owner: String,
    /// Octal permission string, e.g. `"0644"`.
    pub perm: String,
    /// Skip silently when the source is missing.
    #[serde(default)]
    pub optional: bool,
}

/// Load the manifest, preferring the inline value from the environment.
///
/// # Errors
///
/// Returns [`ConfigError::ManifestRead`] if the fallback file cannot be read,
/// [`ConfigError::ManifestParse`] if the content is not valid JSON, and
/// [`ConfigError::ConfigFile`] if required fields are missing.
pub fn load(settings: &Settings) -> Result<Manifest> {
    if let Some(raw) = settings
        .inline_manifest
        .as_deref()
        .filter(|raw| !raw.trim().is_empty())
    {
        tracing::info!("Loading config from environment variable {CONFIG_ENV}");
        return parse(raw, &format!("environment variable {CONFIG_ENV}"));
    }
    load_file(&settings.manifest_path)
}

/// Load and validate the manifest file at `path`.
///
/// # Errors
///
/// See [`load`].
pub fn load_file(path: &Path) -> Result<Manifest> {
    tracing::info!(path = %path.display(), "Loading config file");
    let raw = std::fs::read_to_string(path).map_err(|source| {
        tracing::error!(path = %path.display(), "Could not read config file");
        ConfigError::ManifestRead {
            path: path.to_path_buf(),
            source,
        }
    })?;
    parse(&raw, &path.display().to_string())
}

/// Parse and validate manifest JSON. `origin` names the source in errors.
///
/// # Errors
///
/// See [`load`].
pub fn parse(raw: &str, origin: &str) -> Result<Manifest> {
    let invalid_json = |source| {
        tracing::error!(origin, "Invalid JSON for config");
        ConfigError::ManifestParse {
            origin: origin.to_string(),
            source,
        }
    };

    let value: Value = serde_json::from_str(raw).map_err(invalid_json)?;
    tracing::info!("Validating config file");
    validate(&value)?;
    serde_json::from_value(value).map_err(invalid_json)
}

/// Check the structural invariants that must hold before deserialization.
///
/// # Errors
///
/// Returns [`ConfigError::ConfigFile`] describing the first violation.
pub fn validate(value: &Value) -> Result<()> {
    let Some(root) = value.as_object() else {
        return Err(invalid("config must be a JSON object"));
    };

    if !root.contains_key("command") {
        tracing::error!("Config is missing required \"command\" key");
        return Err(invalid("missing required \"command\" key"));
    }

    let Some(entries) = root.get("config_files") else {
        return Ok(());
    };
    let Some(entries) = entries.as_array() else {
        return Err(invalid("\"config_files\" must be a list"));
    };

    for (index, entry) in entries.iter().enumerate() {
        let Some(entry) = entry.as_object() else {
            return Err(invalid(format!("config_files[{index}] must be an object")));
        };
        let missing: Vec<&str> = REQUIRED_KEYS
            .into_iter()
            .filter(|key| !entry.contains_key(*key))
            .collect();
        if !missing.is_empty() {
            tracing::error!(
                index,
                required = ?REQUIRED_KEYS,
                "Config is missing required keys"
            );
            return Err(invalid(format!(
                "config_files[{index}] is missing required keys: {}",
                missing.join(", ")
            )));
        }
    }
    Ok(())
}

fn invalid(reason: impl Into<String>) -> ConfigError {
    ConfigError::ConfigFile {
        reason: reason.into(),
    }
}
