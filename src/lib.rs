//! Container configuration bootstrapper.
//!
//! Reads a JSON manifest describing which configuration files a service
//! needs, copies them into place with the requested owner and permissions,
//! and writes out the command the container should run. A `--check` mode
//! reports drift between the installed files and their sources instead.
//!
//! The public API is organised into layers:
//!
//! - **[`config`]**: runtime settings, copy strategy, and manifest parsing
//! - **[`resources`]**: per-entry copy and check primitives
//! - **[`commands`]**: top-level orchestration of the apply and check modes
//! - **[`error`]**: the typed error taxonomy shared by all layers
#![deny(clippy::or_fun_call)]
#![deny(clippy::bool_to_int_with_if)]

pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod logging;
pub mod resources;
