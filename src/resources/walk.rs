//! Mirrored traversal of a source tree and its installed destination.
//!
//! Copying, attribute application, and drift checks all walk the same
//! source tree and act on the destination path at the same relative
//! location; they differ only in the [`TreeVisitor`] they pass.
use std::path::Path;

use walkdir::WalkDir;

use crate::error::{ConfigError, Result};

/// Per-path callbacks for [`walk_mirrored`].
pub trait TreeVisitor {
    /// Visit a directory's contents before the directory itself.
    const CONTENTS_FIRST: bool = false;

    /// Called for every directory, including the root.
    fn visit_dir(&mut self, source: &Path, dest: &Path) -> Result<()>;

    /// Called for every non-directory entry (symlinks are followed).
    fn visit_file(&mut self, source: &Path, dest: &Path) -> Result<()>;
}

/// Walk `source_root` in file-name order, calling `visitor` with each entry
/// and its mirror under `dest_root`.
///
/// The first error returned by the visitor stops the walk.
pub fn walk_mirrored<V: TreeVisitor>(
    source_root: &Path,
    dest_root: &Path,
    visitor: &mut V,
) -> Result<()> {
    let walker = WalkDir::new(source_root)
        .follow_links(true)
        .contents_first(V::CONTENTS_FIRST)
        .sort_by_file_name();

    for entry in walker {
        let entry = entry.map_err(|e| walk_error(source_root, e))?;
        let dest = match entry.path().strip_prefix(source_root) {
            Ok(rel) if !rel.as_os_str().is_empty() => dest_root.join(rel),
            _ => dest_root.to_path_buf(),
        };
        if entry.file_type().is_dir() {
            visitor.visit_dir(entry.path(), &dest)?;
        } else {
            visitor.visit_file(entry.path(), &dest)?;
        }
    }
    Ok(())
}

/// Convert a [`walkdir::Error`] into [`ConfigError::Io`], keeping the path
/// of the entry that failed when there is one.
fn walk_error(root: &Path, err: walkdir::Error) -> ConfigError {
    let path = err.path().map_or_else(|| root.to_path_buf(), Path::to_path_buf);
    let source = err.into_io_error().unwrap_or_else(|| {
        std::io::Error::other(format!("filesystem loop under {}", root.display()))
    });
    ConfigError::Io {
        op: "walk",
        path,
        source,
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[derive(Default)]
    struct Recorder {
        visits: Vec<(char, PathBuf)>,
    }

    impl TreeVisitor for Recorder {
        fn visit_dir(&mut self, _source: &Path, dest: &Path) -> Result<()> {
            self.visits.push(('d', dest.to_path_buf()));
            Ok(())
        }

        fn visit_file(&mut self, _source: &Path, dest: &Path) -> Result<()> {
            self.visits.push(('f', dest.to_path_buf()));
            Ok(())
        }
    }

    #[derive(Default)]
    struct PostOrder(Recorder);

    impl TreeVisitor for PostOrder {
        const CONTENTS_FIRST: bool = true;

        fn visit_dir(&mut self, source: &Path, dest: &Path) -> Result<()> {
            self.0.visit_dir(source, dest)
        }

        fn visit_file(&mut self, source: &Path, dest: &Path) -> Result<()> {
            self.0.visit_file(source, dest)
        }
    }

    fn sample_tree() -> tempfile::TempDir {
        let src = tempfile::tempdir().unwrap();
        std::fs::create_dir(src.path().join("sub")).unwrap();
        std::fs::write(src.path().join("sub/inner.conf"), "x").unwrap();
        std::fs::write(src.path().join("top.conf"), "y").unwrap();
        src
    }

    #[test]
    fn mirrors_paths_under_destination_root() {
        let src = sample_tree();
        let dest = Path::new("/etc/app");
        let mut recorder = Recorder::default();

        walk_mirrored(src.path(), dest, &mut recorder).unwrap();

        assert_eq!(
            recorder.visits,
            vec![
                ('d', PathBuf::from("/etc/app")),
                ('d', PathBuf::from("/etc/app/sub")),
                ('f', PathBuf::from("/etc/app/sub/inner.conf")),
                ('f', PathBuf::from("/etc/app/top.conf")),
            ]
        );
    }

    #[test]
    fn contents_first_visits_root_last() {
        let src = sample_tree();
        let mut visitor = PostOrder::default();

        walk_mirrored(src.path(), Path::new("/dest"), &mut visitor).unwrap();

        let visits = visitor.0.visits;
        assert_eq!(visits.last(), Some(&('d', PathBuf::from("/dest"))));
        let sub = visits
            .iter()
            .position(|v| v.1 == Path::new("/dest/sub"))
            .unwrap();
        let inner = visits
            .iter()
            .position(|v| v.1 == Path::new("/dest/sub/inner.conf"))
            .unwrap();
        assert!(inner < sub, "children must precede their directory");
    }

    #[test]
    fn missing_root_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let mut recorder = Recorder::default();
        let err = walk_mirrored(&dir.path().join("absent"), Path::new("/d"), &mut recorder)
            .unwrap_err();
        assert!(matches!(err, ConfigError::Io { op: "walk", .. }));
    }
}
