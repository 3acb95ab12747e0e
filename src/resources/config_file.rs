//! One manifest entry: copy a source glob to its destination with declared
//! ownership and permissions, or verify that a previous copy still holds.
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use super::attributes::{Attributes, Mode, Ownership};
use super::fs::{copy_dir_recursive, ensure_parent_dir, expand_glob, remove_existing};
use super::walk::{TreeVisitor, walk_mirrored};
use super::{Drift, Mismatch, ResourceChange, ResourceState};
use crate::config::manifest::ConfigFileSpec;
use crate::error::{ConfigError, IoContext, Result};

/// A source → destination mapping with owner and permission metadata.
///
/// Stateless: everything persistent lives on the filesystem, so a fresh
/// value is built from the manifest on every invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigFile {
    /// Glob pattern of source paths.
    pub source: String,
    /// Destination; a trailing `/` means "into this directory".
    pub dest: String,
    /// User (and expected group) owning installed files.
    pub owner: String,
    /// Permission bits applied to installed files and directories.
    pub mode: Mode,
    /// Skip silently when the source is missing.
    pub optional: bool,
}

impl TryFrom<&ConfigFileSpec> for ConfigFile {
    type Error = ConfigError;

    fn try_from(spec: &ConfigFileSpec) -> Result<Self> {
        Ok(Self {
            source: spec.source.clone(),
            dest: spec.dest.clone(),
            owner: spec.owner.clone(),
            mode: Mode::parse(&spec.perm)?,
            optional: spec.optional,
        })
    }
}

impl ConfigFile {
    /// Human-readable description of this entry.
    #[must_use]
    pub fn description(&self) -> String {
        format!(
            "{} -> {} ({}, {:04o})",
            self.source,
            self.dest,
            self.owner,
            self.mode.bits()
        )
    }

    /// Copy every match of the source pattern to the destination, replacing
    /// whatever was there, then apply ownership and permissions.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::SourceFileNotFound`] when a required source is
    /// missing, [`ConfigError::UnknownOwner`] when the owner cannot be
    /// resolved, and [`ConfigError::Io`] for any filesystem failure.
    pub fn copy(&self) -> Result<ResourceChange> {
        let Some(sources) = self.matched_sources()? else {
            tracing::info!(source = %self.source, "Skipping optional source that does not exist");
            return Ok(ResourceChange::Skipped {
                reason: format!("optional source {} not found", self.source),
            });
        };

        let attributes = Attributes {
            mode: self.mode,
            ownership: Ownership::resolve(&self.owner)?,
        };
        let mut prepared = HashSet::new();

        for source in &sources {
            if !source.exists() {
                tracing::warn!(source = %source.display(), "Source vanished before copy");
                continue;
            }
            let target = self.target_for(source);
            if prepared.insert(target.clone()) {
                remove_existing(&target)?;
                ensure_parent_dir(&target)?;
            }
            if source.is_dir() {
                tracing::info!(
                    source = %source.display(),
                    dest = %target.display(),
                    "Copying directory"
                );
                copy_dir_recursive(source, &target)?;
                walk_mirrored(source, &target, &mut ApplyAttributes(&attributes))?;
            } else {
                tracing::info!(
                    source = %source.display(),
                    dest = %target.display(),
                    "Copying file"
                );
                fs::copy(source, &target).at_path("copy", source)?;
                attributes.apply(&target)?;
            }
        }
        Ok(ResourceChange::Applied)
    }

    /// Compare installed destinations against their sources and the declared
    /// attributes without modifying anything.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::SourceFileNotFound`] when a required source
    /// pattern matches nothing, and [`ConfigError::Io`] if a path that exists
    /// cannot be read.
    pub fn current_state(&self) -> Result<ResourceState> {
        let sources = expand_glob(&self.source)?;
        if sources.is_empty() && !self.optional {
            return Err(self.not_found());
        }

        let mut compare = CompareTree {
            entry: self,
            source: PathBuf::new(),
            mismatches: Vec::new(),
        };
        for source in sources {
            if !source.exists() {
                continue;
            }
            let target = self.target_for(&source);
            compare.source.clone_from(&source);
            if source.is_dir() {
                walk_mirrored(&source, &target, &mut compare)?;
            } else {
                compare.visit_file(&source, &target)?;
            }
        }

        if compare.mismatches.is_empty() {
            Ok(ResourceState::Correct)
        } else {
            Ok(ResourceState::Incorrect {
                mismatches: compare.mismatches,
            })
        }
    }

    /// Fail when installed files have drifted from the manifest.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::ConfigFileBadState`] naming the source pattern
    /// and every offending source path, plus the errors of
    /// [`current_state`](Self::current_state).
    pub fn check(&self) -> Result<()> {
        match self.current_state()? {
            ResourceState::Correct => Ok(()),
            ResourceState::Incorrect { mismatches } => {
                let mut paths: Vec<PathBuf> = Vec::new();
                for drift in mismatches {
                    if !paths.contains(&drift.source) {
                        paths.push(drift.source);
                    }
                }
                tracing::error!(files = ?paths, "Following files are in bad state");
                Err(ConfigError::ConfigFileBadState {
                    pattern: self.source.clone(),
                    paths,
                })
            }
        }
    }

    /// Expand the source pattern and apply the required/optional policy.
    ///
    /// `Ok(None)` means an optional source is absent and the entry should be
    /// skipped.
    fn matched_sources(&self) -> Result<Option<Vec<PathBuf>>> {
        let sources = expand_glob(&self.source)?;
        let absent = match sources.as_slice() {
            [] => true,
            [only] => !only.exists(),
            _ => false,
        };
        match (absent, self.optional) {
            (false, _) => Ok(Some(sources)),
            (true, true) => Ok(None),
            (true, false) => Err(self.not_found()),
        }
    }

    /// Where `source` lands: `dest/<basename>` for a file copied into a
    /// trailing-separator directory, otherwise `dest` itself.
    fn target_for(&self, source: &Path) -> PathBuf {
        let into_dir = self.dest.ends_with(std::path::MAIN_SEPARATOR);
        match source.file_name() {
            Some(name) if into_dir && !source.is_dir() => Path::new(&self.dest).join(name),
            _ => PathBuf::from(&self.dest),
        }
    }

    fn not_found(&self) -> ConfigError {
        tracing::error!(source = %self.source, "Source file not found");
        ConfigError::SourceFileNotFound {
            pattern: self.source.clone(),
        }
    }
}

/// Applies mode and ownership to each copied path, children first so that
/// restrictive directory modes do not block the rest of the walk.
struct ApplyAttributes<'a>(&'a Attributes);

impl TreeVisitor for ApplyAttributes<'_> {
    const CONTENTS_FIRST: bool = true;

    fn visit_dir(&mut self, _source: &Path, dest: &Path) -> Result<()> {
        self.0.apply(dest)
    }

    fn visit_file(&mut self, _source: &Path, dest: &Path) -> Result<()> {
        self.0.apply(dest)
    }
}

/// Collects every difference between a source tree and its destination.
struct CompareTree<'a> {
    entry: &'a ConfigFile,
    /// Top-level glob match currently being compared.
    source: PathBuf,
    mismatches: Vec<Drift>,
}

impl CompareTree<'_> {
    fn record(&mut self, dest: &Path, mismatch: Mismatch) {
        tracing::error!(
            source = %self.source.display(),
            dest = %dest.display(),
            "{mismatch}"
        );
        self.mismatches.push(Drift {
            source: self.source.clone(),
            dest: dest.to_path_buf(),
            mismatch,
        });
    }

    /// Metadata of `dest` when it exists and has the expected kind.
    fn existing(&mut self, dest: &Path, want_dir: bool) -> Result<Option<fs::Metadata>> {
        let meta = match fs::metadata(dest) {
            Ok(meta) => meta,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                self.record(dest, Mismatch::Missing);
                return Ok(None);
            }
            Err(e) => return Err(e).at_path("stat", dest),
        };
        if meta.is_dir() == want_dir {
            Ok(Some(meta))
        } else {
            let expected = if want_dir { "directory" } else { "file" };
            self.record(dest, Mismatch::WrongType { expected });
            Ok(None)
        }
    }
}

impl TreeVisitor for CompareTree<'_> {
    fn visit_dir(&mut self, _source: &Path, dest: &Path) -> Result<()> {
        if let Some(meta) = self.existing(dest, true)?
            && let Some(mismatch) = self.entry.mode.compare(&meta)
        {
            self.record(dest, mismatch);
        }
        Ok(())
    }

    fn visit_file(&mut self, source: &Path, dest: &Path) -> Result<()> {
        let Some(meta) = self.existing(dest, false)? else {
            return Ok(());
        };
        let expected = fs::read(source).at_path("read", source)?;
        let actual = fs::read(dest).at_path("read", dest)?;
        if expected != actual {
            self.record(dest, Mismatch::Content);
        }
        if let Some(mismatch) = self.entry.mode.compare(&meta) {
            self.record(dest, mismatch);
        }
        for mismatch in Ownership::compare(&self.entry.owner, &meta) {
            self.record(dest, mismatch);
        }
        Ok(())
    }
}
