//! `set_configs` entry point.
use std::process::ExitCode;

use clap::Parser;
use config_bootstrap::config::Settings;
use config_bootstrap::error::ConfigError;
use config_bootstrap::{cli, commands, logging};

fn main() -> ExitCode {
    let args = cli::Cli::parse();
    logging::init_subscriber();
    let settings = Settings::from_env();

    match commands::run(&args, &settings) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            let typed = err.chain().find_map(|e| e.downcast_ref::<ConfigError>());
            match typed {
                Some(e) if !e.is_unexpected() => tracing::error!("Config error: {err:#}"),
                _ => tracing::error!("Unexpected error: {err:?}"),
            }
            ExitCode::FAILURE
        }
    }
}
