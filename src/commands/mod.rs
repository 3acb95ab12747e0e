//! Top-level mode orchestration: apply (copy strategy) or check.
pub mod apply;
pub mod check;

use anyhow::{Context as _, Result};

use crate::cli::Cli;
use crate::config::Settings;
use crate::config::manifest;

/// Load the manifest and run the mode selected on the command line.
///
/// # Errors
///
/// Returns an error if the manifest cannot be loaded, the strategy is
/// invalid, or any entry fails to copy or check.
pub fn run(args: &Cli, settings: &Settings) -> Result<()> {
    let version =
        option_env!("CONFIG_BOOTSTRAP_VERSION").unwrap_or(env!("CARGO_PKG_VERSION"));
    tracing::debug!(version, "set_configs starting");

    let manifest = manifest::load(settings).context("loading config")?;

    if args.check {
        check::execute_config_check(&manifest).context("checking config files")?;
    } else {
        let outcome = apply::execute_config_strategy(&manifest, settings)
            .context("applying config strategy")?;
        tracing::debug!(?outcome, "Config strategy finished");
    }
    Ok(())
}
