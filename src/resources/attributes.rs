//! Permission bits and ownership: parsing, applying, and inspecting.
use std::fs::{self, Metadata};
use std::os::unix::fs::{MetadataExt, PermissionsExt};
use std::path::Path;

use nix::unistd::{Gid, Group, Uid, User};

use super::Mismatch;
use crate::error::{ConfigError, IoContext, Result};

/// Highest mode accepted from a manifest (setuid/setgid/sticky + rwx).
const MAX_MODE: u32 = 0o7777;

/// Permission bits declared by a manifest entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Mode(u32);

impl Mode {
    /// Parse an octal permission string such as `"0644"`, `"644"` or `"0o644"`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidPermission`] if the value is not octal or
    /// exceeds `0o7777`.
    ///
    /// # Examples
    ///
    /// ```
    /// use config_bootstrap::resources::attributes::Mode;
    ///
    /// assert_eq!(Mode::parse("0640").unwrap().bits(), 0o640);
    /// assert_eq!(Mode::parse("0o755").unwrap().bits(), 0o755);
    /// assert!(Mode::parse("0999").is_err());
    /// ```
    pub fn parse(perm: &str) -> Result<Self> {
        let trimmed = perm.trim();
        let digits = trimmed
            .strip_prefix("0o")
            .or_else(|| trimmed.strip_prefix("0O"))
            .unwrap_or(trimmed);
        if !digits.starts_with(|c: char| c.is_digit(8)) {
            return Err(ConfigError::InvalidPermission {
                perm: perm.to_string(),
            });
        }
        u32::from_str_radix(digits, 8)
            .ok()
            .filter(|bits| *bits <= MAX_MODE)
            .map(Self)
            .ok_or_else(|| ConfigError::InvalidPermission {
                perm: perm.to_string(),
            })
    }

    /// Raw permission bits.
    #[must_use]
    pub const fn bits(self) -> u32 {
        self.0
    }

    /// Set these bits on `path` verbatim (no umask).
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the permissions cannot be changed.
    pub fn apply(self, path: &Path) -> Result<()> {
        fs::set_permissions(path, fs::Permissions::from_mode(self.0)).at_path("chmod", path)
    }

    /// Compare against the permission bits in `meta`.
    #[must_use]
    pub fn compare(self, meta: &Metadata) -> Option<Mismatch> {
        let actual = meta.mode() & MAX_MODE;
        (actual != self.0).then_some(Mismatch::Mode {
            expected: self.0,
            actual,
        })
    }
}

/// Ownership resolved from a manifest `owner`.
///
/// The user's primary group is applied; [`Ownership::compare`] expects the
/// group *name* to equal the owner name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ownership {
    name: String,
    uid: Uid,
    gid: Gid,
}

impl Ownership {
    /// Look up `owner` in the user database.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::UnknownOwner`] if no such user exists, or
    /// [`ConfigError::Io`] if the lookup itself fails.
    pub fn resolve(owner: &str) -> Result<Self> {
        let user = User::from_name(owner)
            .at_path("look up user", Path::new(owner))?
            .ok_or_else(|| ConfigError::UnknownOwner {
                owner: owner.to_string(),
            })?;
        Ok(Self {
            name: owner.to_string(),
            uid: user.uid,
            gid: user.gid,
        })
    }

    /// The owner name this ownership was resolved from.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Change the owner and group of `path`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the ownership cannot be changed.
    pub fn apply(&self, path: &Path) -> Result<()> {
        tracing::debug!(path = %path.display(), owner = self.name(), "Setting ownership");
        nix::unistd::chown(path, Some(self.uid), Some(self.gid)).at_path("chown", path)
    }

    /// Compare the owning user and group names in `meta` against `owner`.
    ///
    /// Works from the name alone so that check mode reports an unknown
    /// owner as drift instead of failing the lookup.
    #[must_use]
    pub fn compare(owner: &str, meta: &Metadata) -> Vec<Mismatch> {
        let mut mismatches = Vec::new();
        let user = user_name(Uid::from_raw(meta.uid()));
        if user != owner {
            mismatches.push(Mismatch::User {
                expected: owner.to_string(),
                actual: user,
            });
        }
        let group = group_name(Gid::from_raw(meta.gid()));
        if group != owner {
            mismatches.push(Mismatch::Group {
                expected: owner.to_string(),
                actual: group,
            });
        }
        mismatches
    }
}

/// Mode and ownership applied together to every installed path.
#[derive(Debug, Clone)]
pub struct Attributes {
    /// Declared permission bits.
    pub mode: Mode,
    /// Resolved owner.
    pub ownership: Ownership,
}

impl Attributes {
    /// Apply ownership, then mode (chown may clear setuid/setgid bits).
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if either change fails.
    pub fn apply(&self, path: &Path) -> Result<()> {
        self.ownership.apply(path)?;
        self.mode.apply(path)
    }
}

/// Name of the user with `uid`, or the numeric id when it has no entry.
fn user_name(uid: Uid) -> String {
    User::from_uid(uid)
        .ok()
        .flatten()
        .map_or_else(|| uid.to_string(), |u| u.name)
}

/// Name of the group with `gid`, or the numeric id when it has no entry.
fn group_name(gid: Gid) -> String {
    Group::from_gid(gid)
        .ok()
        .flatten()
        .map_or_else(|| gid.to_string(), |g| g.name)
}
