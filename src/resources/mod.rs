//! Idempotent file reconciliation primitives (copy + check pattern).
pub mod attributes;
pub mod config_file;
pub mod fs;
mod walk;

use std::fmt;
use std::path::PathBuf;

/// Result of applying a manifest entry.
///
/// # Examples
///
/// ```
/// use config_bootstrap::resources::ResourceChange;
///
/// let applied = ResourceChange::Applied;
/// let skipped = ResourceChange::Skipped { reason: "source missing".into() };
///
/// assert_eq!(applied, ResourceChange::Applied);
/// assert_ne!(applied, skipped);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResourceChange {
    /// Files were copied and their attributes applied.
    Applied,
    /// Nothing was done (e.g. an optional source is missing).
    Skipped {
        /// Reason why the entry was skipped.
        reason: String,
    },
}

/// Installed state of a manifest entry relative to its sources.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResourceState {
    /// Every destination matches its source and declared attributes.
    Correct,
    /// At least one destination differs.
    Incorrect {
        /// Every difference found, in traversal order.
        mismatches: Vec<Drift>,
    },
}

/// One difference between a source and its installed destination.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Drift {
    /// Matched source path (the top-level glob match).
    pub source: PathBuf,
    /// Destination path that differs.
    pub dest: PathBuf,
    /// What differs.
    pub mismatch: Mismatch,
}

/// The kind of difference found at a destination path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mismatch {
    /// The destination does not exist.
    Missing,
    /// The destination is not the same kind of entry as the source.
    WrongType {
        /// Expected kind (`"file"` or `"directory"`).
        expected: &'static str,
    },
    /// File content differs from the source.
    Content,
    /// Permission bits differ.
    Mode {
        /// Declared mode.
        expected: u32,
        /// Mode found on disk.
        actual: u32,
    },
    /// Owning user differs.
    User {
        /// Declared owner.
        expected: String,
        /// Owning user found on disk.
        actual: String,
    },
    /// Owning group differs.
    Group {
        /// Declared owner (the group is expected to share its name).
        expected: String,
        /// Owning group found on disk.
        actual: String,
    },
}

impl fmt::Display for Mismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Missing => f.write_str("destination does not exist"),
            Self::WrongType { expected } => write!(f, "destination is not a {expected}"),
            Self::Content => f.write_str("content differs from source"),
            Self::Mode { expected, actual } => {
                write!(f, "expected perm {expected:04o}, actual {actual:04o}")
            }
            Self::User { expected, actual } => {
                write!(f, "expected user {expected}, actual {actual}")
            }
            Self::Group { expected, actual } => {
                write!(f, "expected group {expected}, actual {actual}")
            }
        }
    }
}
