//! Command-line interface for `set_configs`.
use clap::Parser;

/// Command line of the configuration bootstrapper.
///
/// Everything else (manifest, strategy) comes from the environment; see
/// [`Settings`](crate::config::Settings).
#[derive(Parser, Debug)]
#[command(
    name = "set_configs",
    about = "Copy service configuration into place at container startup",
    version
)]
pub struct Cli {
    /// Check whether the configs changed instead of copying them
    #[arg(long)]
    pub check: bool,
}
