// Shared helpers for integration tests.
//
// Provides a temporary-directory-backed container root and a fluent builder
// so each integration test can stage sources, a manifest, and settings
// without repeating filesystem boilerplate.
//
// Used by all integration test binaries that declare `mod common;`.
#![allow(dead_code)]

use std::os::unix::fs::PermissionsExt as _;
use std::path::{Path, PathBuf};

use config_bootstrap::config::Settings;
use serde_json::{Value, json};

/// Name of the user running the tests.
pub fn current_user() -> String {
    nix::unistd::User::from_uid(nix::unistd::getuid())
        .expect("look up current uid")
        .expect("current uid has a passwd entry")
        .name
}

/// The current user, if their primary group shares their name.
///
/// Check mode compares the group name against the configured owner, so
/// tests expecting a clean check only run under such an account.
pub fn owner_with_matching_group() -> Option<String> {
    let user = nix::unistd::User::from_uid(nix::unistd::getuid()).ok()??;
    let group = nix::unistd::Group::from_gid(user.gid).ok()??;
    (group.name == user.name).then_some(user.name)
}

/// Permission bits of `path`.
pub fn mode_of(path: &Path) -> u32 {
    std::fs::metadata(path).expect("stat").permissions().mode() & 0o7777
}

/// An isolated container root backed by a [`tempfile::TempDir`].
///
/// `src/` holds staged sources, `etc/` is the install target, and `run/`
/// receives the command and sentinel files.
pub struct IntegrationTestContext {
    /// Temporary directory standing in for the container filesystem.
    pub root: tempfile::TempDir,
    entries: Vec<Value>,
    command: String,
}

impl IntegrationTestContext {
    /// Create an empty context with the `src/` directory in place.
    pub fn new() -> Self {
        let root = tempfile::tempdir().expect("create temp dir");
        std::fs::create_dir_all(root.path().join("src")).expect("create src dir");
        Self {
            root,
            entries: Vec::new(),
            command: "/usr/bin/service --foreground".to_string(),
        }
    }

    /// Path to `relative` under the context root.
    pub fn path(&self, relative: &str) -> PathBuf {
        self.root.path().join(relative)
    }

    /// Same as [`path`](Self::path), rendered for a manifest field.
    pub fn path_str(&self, relative: &str) -> String {
        self.path(relative).display().to_string()
    }

    /// Manifest JSON built from the entries added so far.
    pub fn manifest_json(&self) -> String {
        json!({
            "command": self.command,
            "config_files": self.entries,
        })
        .to_string()
    }

    /// Settings pointing every path into the context root, with the
    /// manifest inline and the given strategy.
    pub fn settings(&self, strategy: Option<&str>) -> Settings {
        Settings {
            inline_manifest: Some(self.manifest_json()),
            strategy: strategy.map(str::to_string),
            manifest_path: self.path("config.json"),
            command_path: self.path("run/run_command"),
            sentinel_path: self.path("run/configured"),
        }
    }

    /// The command file path used by [`settings`](Self::settings).
    pub fn command_path(&self) -> PathBuf {
        self.path("run/run_command")
    }

    /// The sentinel path used by [`settings`](Self::settings).
    pub fn sentinel_path(&self) -> PathBuf {
        self.path("run/configured")
    }
}

/// Fluent builder for [`IntegrationTestContext`].
pub struct TestContextBuilder {
    ctx: IntegrationTestContext,
}

impl TestContextBuilder {
    /// Begin building a new, empty context.
    pub fn new() -> Self {
        Self {
            ctx: IntegrationTestContext::new(),
        }
    }

    /// Write `content` to `src/<name>`, creating parent directories.
    pub fn with_source(self, name: &str, content: &str) -> Self {
        let path = self.ctx.path("src").join(name);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("create source parent");
        }
        std::fs::write(&path, content).expect("write source file");
        self
    }

    /// Add a manifest entry copying `src/<source>` to `<dest>` under the root.
    ///
    /// A trailing `/` on `dest` is preserved.
    pub fn with_entry(self, source: &str, dest: &str, owner: &str, perm: &str) -> Self {
        self.with_entry_optional(source, dest, owner, perm, false)
    }

    /// Add a manifest entry with an explicit `optional` flag.
    pub fn with_entry_optional(
        mut self,
        source: &str,
        dest: &str,
        owner: &str,
        perm: &str,
        optional: bool,
    ) -> Self {
        let source = self.ctx.path("src").join(source).display().to_string();
        let dest = self.ctx.path_str(dest);
        self.ctx.entries.push(json!({
            "source": source,
            "dest": dest,
            "owner": owner,
            "perm": perm,
            "optional": optional,
        }));
        self
    }

    /// Replace the manifest command.
    pub fn with_command(mut self, command: &str) -> Self {
        self.ctx.command = command.to_string();
        self
    }

    /// Finish building and return the configured context.
    pub fn build(self) -> IntegrationTestContext {
        self.ctx
    }
}

/// The typed error carried somewhere in `err`'s context chain.
pub fn config_error(err: &anyhow::Error) -> &config_bootstrap::error::ConfigError {
    err.chain()
        .find_map(|e| e.downcast_ref::<config_bootstrap::error::ConfigError>())
        .expect("error chain carries a ConfigError")
}
