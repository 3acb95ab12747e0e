//! File-system helpers for destination preparation and tree copies.
use std::fs;
use std::path::{Path, PathBuf};

use super::walk::{TreeVisitor, walk_mirrored};
use crate::error::{ConfigError, IoContext, Result};

/// Ensure the parent directory of `path` exists, creating it (and any
/// ancestors) if necessary.
///
/// # Errors
///
/// Returns an error if the directory cannot be created.
pub fn ensure_parent_dir(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent).at_path("create parent", parent)?;
    }
    Ok(())
}

/// Remove whatever exists at `path`: a directory tree recursively, a file or
/// symlink (including a broken one) by unlinking. Does nothing if `path`
/// does not exist.
///
/// Symlinks are never followed, so a link to a directory removes the link
/// only.
///
/// # Errors
///
/// Returns an error if the path exists but cannot be removed.
pub fn remove_existing(path: &Path) -> Result<()> {
    let Ok(meta) = path.symlink_metadata() else {
        return Ok(());
    };
    tracing::info!(path = %path.display(), "Removing existing destination");
    if meta.is_dir() {
        fs::remove_dir_all(path).at_path("remove directory", path)
    } else {
        fs::remove_file(path).at_path("remove file", path)
    }
}

/// Recursively copy a directory tree.
///
/// Symlinks within the source tree are *followed*: directory symlinks are
/// recursed into and their contents materialised rather than copying the
/// link itself.
///
/// # Errors
///
/// Returns an error if a destination directory cannot be created, a source
/// entry cannot be read, or a file cannot be copied.
pub fn copy_dir_recursive(src: &Path, dst: &Path) -> Result<()> {
    walk_mirrored(src, dst, &mut CopyTree)
}

/// Creates each directory and copies each file at its mirrored path.
#[derive(Debug)]
struct CopyTree;

impl TreeVisitor for CopyTree {
    fn visit_dir(&mut self, _source: &Path, dest: &Path) -> Result<()> {
        fs::create_dir_all(dest).at_path("create directory", dest)
    }

    fn visit_file(&mut self, source: &Path, dest: &Path) -> Result<()> {
        fs::copy(source, dest).at_path("copy", source).map(drop)
    }
}

/// Expand a glob pattern into the matching paths, ordered by path.
///
/// Wildcards never match a leading `.`; hidden files are only matched by a
/// pattern that spells the dot out, such as `.*`.
///
/// # Errors
///
/// Returns [`ConfigError::InvalidPattern`] for a malformed pattern, or
/// [`ConfigError::Io`] if a directory cannot be read during expansion.
pub fn expand_glob(pattern: &str) -> Result<Vec<PathBuf>> {
    let options = glob::MatchOptions {
        require_literal_leading_dot: true,
        ..glob::MatchOptions::new()
    };
    let paths = glob::glob_with(pattern, options).map_err(|source| ConfigError::InvalidPattern {
        pattern: pattern.to_string(),
        source,
    })?;
    paths
        .map(|entry| {
            entry.map_err(|e| {
                let path = e.path().to_path_buf();
                ConfigError::Io {
                    op: "expand glob",
                    path,
                    source: e.into(),
                }
            })
        })
        .collect()
}
