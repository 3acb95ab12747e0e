//! Domain-specific error types for the configuration bootstrapper.
//!
//! Library code returns [`ConfigError`] through the [`Result`] alias; the
//! command layer converts to [`anyhow::Error`] via the standard `?` operator
//! and `main` maps every failure to exit status 1.
//!
//! # Error taxonomy
//!
//! ```text
//! ConfigError
//! ├── ManifestParse / ManifestRead : manifest is not valid JSON or unreadable
//! ├── ConfigFile                   : manifest lacks required fields
//! ├── BadConfigStrategy            : unrecognised or missing strategy
//! ├── SourceFileNotFound           : required source glob matched nothing
//! ├── ConfigFileBadState           : installed files drifted from the manifest
//! ├── InvalidPermission            : `perm` is not an octal mode
//! ├── UnknownOwner                 : `owner` is not a known user
//! ├── InvalidPattern               : `source` is not a valid glob
//! └── Io                           : unexpected filesystem failure
//! ```

use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

/// Result alias used throughout the library.
pub type Result<T, E = ConfigError> = std::result::Result<T, E>;

/// Errors raised while loading, applying, or checking the manifest.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The manifest is not valid JSON, or a field has the wrong type.
    #[error("invalid manifest JSON from {origin}: {source}")]
    ManifestParse {
        /// Where the manifest came from (environment variable or file path).
        origin: String,
        /// Underlying decoder error.
        source: serde_json::Error,
    },

    /// The fallback manifest file could not be read.
    #[error("could not read manifest file {path}: {source}")]
    ManifestRead {
        /// Path of the manifest file.
        path: PathBuf,
        /// Underlying I/O error.
        source: io::Error,
    },

    /// The manifest is missing required structural fields.
    #[error("invalid manifest: {reason}")]
    ConfigFile {
        /// Human-readable description of the structural problem.
        reason: String,
    },

    /// The copy strategy selector is missing or unrecognised.
    #[error("copy strategy is not set properly (got {})", display_strategy(.value.as_deref()))]
    BadConfigStrategy {
        /// The raw value that was supplied, if any.
        value: Option<String>,
    },

    /// A required source pattern resolved to no existing path.
    #[error("source file not found: {pattern}")]
    SourceFileNotFound {
        /// The glob pattern from the manifest entry.
        pattern: String,
    },

    /// Installed files no longer match the manifest.
    #[error("{pattern} has bad state ({} path(s) differ)", .paths.len())]
    ConfigFileBadState {
        /// The glob pattern from the manifest entry.
        pattern: String,
        /// Matched source paths whose destinations differ.
        paths: Vec<PathBuf>,
    },

    /// The `perm` value is not a valid octal permission mode.
    #[error("invalid permission '{perm}': expected an octal mode such as 0644")]
    InvalidPermission {
        /// The raw permission string.
        perm: String,
    },

    /// The `owner` value does not name a known user.
    #[error("unknown owner '{owner}'")]
    UnknownOwner {
        /// The raw owner name.
        owner: String,
    },

    /// The `source` value is not a valid glob pattern.
    #[error("invalid source pattern '{pattern}': {source}")]
    InvalidPattern {
        /// The raw glob pattern.
        pattern: String,
        /// Underlying pattern error.
        source: glob::PatternError,
    },

    /// An unexpected filesystem failure.
    #[error("{op} {}: {source}", .path.display())]
    Io {
        /// The operation that failed (e.g. `"copy"`, `"chmod"`).
        op: &'static str,
        /// Path the operation acted on.
        path: PathBuf,
        /// Underlying I/O error.
        source: io::Error,
    },
}

impl ConfigError {
    /// Whether this error is outside the configuration taxonomy, i.e. an
    /// underlying filesystem failure rather than a manifest problem.
    #[must_use]
    pub const fn is_unexpected(&self) -> bool {
        matches!(self, Self::Io { .. })
    }
}

fn display_strategy(value: Option<&str>) -> String {
    value.map_or_else(|| "nothing".to_string(), |v| format!("'{v}'"))
}

/// Attach the failing operation and path to low-level errors.
pub(crate) trait IoContext<T> {
    /// Convert the error into [`ConfigError::Io`] for `op` on `path`.
    fn at_path(self, op: &'static str, path: &Path) -> Result<T>;
}

impl<T> IoContext<T> for std::result::Result<T, io::Error> {
    fn at_path(self, op: &'static str, path: &Path) -> Result<T> {
        self.map_err(|source| ConfigError::Io {
            op,
            path: path.to_path_buf(),
            source,
        })
    }
}

impl<T> IoContext<T> for std::result::Result<T, nix::errno::Errno> {
    fn at_path(self, op: &'static str, path: &Path) -> Result<T> {
        self.map_err(io::Error::from).at_path(op, path)
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn bad_strategy_display_names_value() {
        let e = ConfigError::BadConfigStrategy {
            value: Some("BOGUS".to_string()),
        };
        assert_eq!(
            e.to_string(),
            "copy strategy is not set properly (got 'BOGUS')"
        );
    }

    #[test]
    fn bad_strategy_display_when_unset() {
        let e = ConfigError::BadConfigStrategy { value: None };
        assert_eq!(
            e.to_string(),
            "copy strategy is not set properly (got nothing)"
        );
    }

    #[test]
    fn source_not_found_display() {
        let e = ConfigError::SourceFileNotFound {
            pattern: "/src/*.conf".to_string(),
        };
        assert_eq!(e.to_string(), "source file not found: /src/*.conf");
    }

    #[test]
    fn bad_state_display_counts_paths() {
        let e = ConfigError::ConfigFileBadState {
            pattern: "/src/*.conf".to_string(),
            paths: vec![PathBuf::from("/src/a.conf"), PathBuf::from("/src/b.conf")],
        };
        assert_eq!(e.to_string(), "/src/*.conf has bad state (2 path(s) differ)");
    }

    #[test]
    fn io_context_records_op_and_path() {
        let result: std::result::Result<(), io::Error> = Err(io::Error::new(
            io::ErrorKind::PermissionDenied,
            "permission denied",
        ));
        let e = result.at_path("chmod", Path::new("/etc/app.conf")).unwrap_err();
        assert!(e.is_unexpected());
        assert!(e.to_string().starts_with("chmod /etc/app.conf:"));
    }

    #[test]
    fn errno_converts_through_io_context() {
        let result: std::result::Result<(), nix::errno::Errno> = Err(nix::errno::Errno::EPERM);
        let e = result.at_path("chown", Path::new("/etc/app.conf")).unwrap_err();
        assert!(matches!(e, ConfigError::Io { op: "chown", .. }));
    }

    #[test]
    fn taxonomy_errors_are_expected() {
        let e = ConfigError::ConfigFile {
            reason: "missing \"command\"".to_string(),
        };
        assert!(!e.is_unexpected());
    }

    #[test]
    fn io_error_has_source() {
        use std::error::Error as StdError;
        let e = ConfigError::ManifestRead {
            path: PathBuf::from("/var/lib/config.json"),
            source: io::Error::new(io::ErrorKind::NotFound, "no such file"),
        };
        assert!(e.source().is_some());
    }

    fn assert_send_sync<T: Send + Sync>() {}

    #[test]
    fn config_error_is_send_sync() {
        assert_send_sync::<ConfigError>();
    }

    #[test]
    fn config_error_converts_to_anyhow() {
        let e = ConfigError::UnknownOwner {
            owner: "nobody-here".to_string(),
        };
        let _anyhow_err: anyhow::Error = e.into();
    }
}
