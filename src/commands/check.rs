//! Check mode: verify installed files still match the manifest.
use crate::config::manifest::Manifest;
use crate::error::Result;
use crate::resources::config_file::ConfigFile;

/// Check every manifest entry in order, stopping at the first failure.
///
/// # Errors
///
/// Returns the first entry's
/// [`ConfigFileBadState`](crate::error::ConfigError::ConfigFileBadState),
/// [`SourceFileNotFound`](crate::error::ConfigError::SourceFileNotFound), or
/// other error.
pub fn execute_config_check(manifest: &Manifest) -> Result<()> {
    for spec in &manifest.config_files {
        let config_file = ConfigFile::try_from(spec)?;
        tracing::debug!(entry = %config_file.description(), "Checking entry");
        config_file.check()?;
    }
    tracing::info!(
        count = manifest.config_files.len(),
        "All config files are in expected state"
    );
    Ok(())
}
