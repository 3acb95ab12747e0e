//! Apply mode: run the selected copy strategy over the manifest.
use std::fs;
use std::path::Path;

use crate::config::Settings;
use crate::config::manifest::Manifest;
use crate::config::strategy::CopyStrategy;
use crate::error::{IoContext, Result};
use crate::resources::config_file::ConfigFile;
use crate::resources::fs::ensure_parent_dir;

/// What a strategy run did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StrategyOutcome {
    /// Every entry was copied and the command file written.
    Copied,
    /// `COPY_ONCE` found the sentinel and left everything untouched.
    AlreadyConfigured,
}

/// Run the copy strategy named in `settings`.
///
/// # Errors
///
/// Returns [`ConfigError::BadConfigStrategy`](crate::error::ConfigError::BadConfigStrategy)
/// for a missing or unknown strategy, and any error from [`copy_config`].
pub fn execute_config_strategy(manifest: &Manifest, settings: &Settings) -> Result<StrategyOutcome> {
    let strategy = CopyStrategy::from_setting(settings.strategy.as_deref()).inspect_err(|_| {
        tracing::error!(strategy = ?settings.strategy, "Config strategy is not set properly");
    })?;
    tracing::info!(%strategy, "Config strategy selected");

    match strategy {
        CopyStrategy::CopyAlways => {
            copy_config(manifest, &settings.command_path)?;
            Ok(StrategyOutcome::Copied)
        }
        CopyStrategy::CopyOnce if settings.sentinel_path.exists() => {
            tracing::info!(
                sentinel = %settings.sentinel_path.display(),
                "The config strategy prevents copying new configs"
            );
            Ok(StrategyOutcome::AlreadyConfigured)
        }
        CopyStrategy::CopyOnce => {
            copy_config(manifest, &settings.command_path)?;
            mark_configured(&settings.sentinel_path)?;
            Ok(StrategyOutcome::Copied)
        }
    }
}

/// Copy every manifest entry in order, then write the command file.
///
/// The first failing entry aborts the pass; the command file is only
/// written once every entry succeeded.
///
/// # Errors
///
/// Returns the first entry error, or [`ConfigError::Io`](crate::error::ConfigError::Io)
/// if the command file cannot be written.
pub fn copy_config(manifest: &Manifest, command_path: &Path) -> Result<()> {
    if manifest.config_files.is_empty() {
        tracing::debug!("No files to copy found in config");
    } else {
        tracing::info!(
            count = manifest.config_files.len(),
            "Copying service configuration files"
        );
        for spec in &manifest.config_files {
            let config_file = ConfigFile::try_from(spec)?;
            tracing::debug!(entry = %config_file.description(), "Applying entry");
            config_file.copy()?;
        }
    }

    tracing::info!(path = %command_path.display(), "Writing out command to execute");
    tracing::debug!(command = %manifest.command, "Command is");
    ensure_parent_dir(command_path)?;
    fs::write(command_path, &manifest.command).at_path("write command", command_path)
}

/// Create the sentinel marking a completed `COPY_ONCE` pass.
///
/// Plain create: two concurrent first runs may both copy.
fn mark_configured(sentinel: &Path) -> Result<()> {
    ensure_parent_dir(sentinel)?;
    fs::File::create(sentinel)
        .map(drop)
        .at_path("create sentinel", sentinel)
}
