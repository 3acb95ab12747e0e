//! Process configuration: environment-derived settings, the manifest, and
//! the copy strategy selector.
pub mod manifest;
pub mod strategy;

use std::path::PathBuf;

/// Environment variable holding an inline JSON manifest.
pub const CONFIG_ENV: &str = "KOLLA_CONFIG";

/// Environment variable selecting the copy strategy.
pub const STRATEGY_ENV: &str = "KOLLA_CONFIG_STRATEGY";

/// Manifest file read when no inline manifest is provided.
pub const DEFAULT_MANIFEST_PATH: &str = "/var/lib/kolla/config_files/config.json";

/// File receiving the service command after a successful copy pass.
pub const DEFAULT_COMMAND_PATH: &str = "/run_command";

/// Marker file whose existence means `COPY_ONCE` already ran.
pub const DEFAULT_SENTINEL_PATH: &str = "/configured";

/// Settings resolved once at process start and passed down by reference.
///
/// # Examples
///
/// ```
/// use config_bootstrap::config::Settings;
///
/// let settings = Settings::from_lookup(|key| match key {
///     "KOLLA_CONFIG_STRATEGY" => Some("COPY_ONCE".to_string()),
///     _ => None,
/// });
/// assert_eq!(settings.strategy.as_deref(), Some("COPY_ONCE"));
/// assert!(settings.inline_manifest.is_none());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    /// Inline manifest JSON, taking precedence over `manifest_path`.
    pub inline_manifest: Option<String>,
    /// Raw copy strategy value; parsed when a copy pass runs.
    pub strategy: Option<String>,
    /// Fallback manifest file.
    pub manifest_path: PathBuf,
    /// Where the manifest `command` is written.
    pub command_path: PathBuf,
    /// Sentinel marking a completed `COPY_ONCE` pass.
    pub sentinel_path: PathBuf,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            inline_manifest: None,
            strategy: None,
            manifest_path: PathBuf::from(DEFAULT_MANIFEST_PATH),
            command_path: PathBuf::from(DEFAULT_COMMAND_PATH),
            sentinel_path: PathBuf::from(DEFAULT_SENTINEL_PATH),
        }
    }
}

impl Settings {
    /// Read settings from the process environment.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build settings from an arbitrary key lookup, using the well-known
    /// default paths.
    #[must_use]
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        Self {
            inline_manifest: lookup(CONFIG_ENV),
            strategy: lookup(STRATEGY_ENV),
            ..Self::default()
        }
    }
}
