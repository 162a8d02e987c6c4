//! Filesystem boundary for file-backed records.
//!
//! The engine never walks directories itself; it asks a [`FileSystem`] for
//! candidate files under a group root and for the contents of named files.
//! The default implementation is a thin wrapper over `std::fs`.

use camino::{Utf8Path, Utf8PathBuf};

use crate::error::{ConfigError, ConfigResult};
use crate::result_ext::IntoShared;

/// Source of candidate configuration files and their contents.
pub trait FileSystem: Send + Sync {
    /// List files under `root`, optionally descending into subdirectories.
    ///
    /// The listing must be deterministic; the engine sorts no further.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] when the root or an entry cannot be
    /// enumerated.
    fn list(&self, root: &Utf8Path, recursive: bool) -> ConfigResult<Vec<Utf8PathBuf>>;

    /// Read the contents of `path`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] when the file cannot be read.
    fn read(&self, path: &Utf8Path) -> ConfigResult<Vec<u8>>;
}

/// Default [`FileSystem`] backed by `std::fs`.
#[derive(Clone, Copy, Debug, Default)]
pub struct StdFileSystem;

impl FileSystem for StdFileSystem {
    fn list(&self, root: &Utf8Path, recursive: bool) -> ConfigResult<Vec<Utf8PathBuf>> {
        let mut pending = vec![root.to_path_buf()];
        let mut files = Vec::new();
        while let Some(dir) = pending.pop() {
            let entries = std::fs::read_dir(dir.as_std_path())
                .map_err(|error| ConfigError::io(dir.clone(), error))
                .into_shared()?;
            for entry in entries {
                let resolved = entry
                    .map_err(|error| ConfigError::io(dir.clone(), error))
                    .into_shared()?;
                let path = to_utf8_path(resolved.path());
                let kind = resolved
                    .file_type()
                    .map_err(|error| ConfigError::io(path.clone(), error))
                    .into_shared()?;
                if kind.is_dir() {
                    if recursive {
                        pending.push(path);
                    }
                } else {
                    files.push(path);
                }
            }
        }
        files.sort();
        Ok(files)
    }

    fn read(&self, path: &Utf8Path) -> ConfigResult<Vec<u8>> {
        std::fs::read(path.as_std_path())
            .map_err(|error| ConfigError::io(path.to_path_buf(), error))
            .into_shared()
    }
}

/// Convert a standard path to UTF-8, falling back to lossy conversion.
fn to_utf8_path(path: std::path::PathBuf) -> Utf8PathBuf {
    Utf8PathBuf::from_path_buf(path)
        .unwrap_or_else(|raw| Utf8PathBuf::from(raw.to_string_lossy().into_owned()))
}

/// A directory of configuration files resolved into records at compile
/// time.
///
/// Files whose extension has no registered codec are skipped during
/// enumeration rather than treated as errors.
#[derive(Clone, Debug)]
pub struct FileGroup {
    pub(crate) root: Utf8PathBuf,
    pub(crate) recursive: bool,
}

impl FileGroup {
    /// A group rooted at `root`.
    #[must_use]
    pub fn new(root: impl Into<Utf8PathBuf>, recursive: bool) -> Self {
        Self {
            root: root.into(),
            recursive,
        }
    }
}

#[cfg(test)]
mod tests {
    use anyhow::{Result, anyhow, ensure};

    use super::{FileSystem, StdFileSystem, to_utf8_path};

    #[test]
    fn lists_files_sorted_and_skips_directories() -> Result<()> {
        let dir = tempfile::tempdir()?;
        std::fs::write(dir.path().join("b.json"), b"{}")?;
        std::fs::write(dir.path().join("a.json"), b"{}")?;
        std::fs::create_dir(dir.path().join("nested"))?;
        std::fs::write(dir.path().join("nested").join("c.json"), b"{}")?;

        let root = to_utf8_path(dir.path().to_path_buf());
        let flat = StdFileSystem
            .list(&root, false)
            .map_err(|error| anyhow!("{error}"))?;
        let names: Vec<_> = flat
            .iter()
            .filter_map(|path| path.file_name())
            .collect();
        ensure!(names == ["a.json", "b.json"], "unexpected listing: {names:?}");

        let deep = StdFileSystem
            .list(&root, true)
            .map_err(|error| anyhow!("{error}"))?;
        ensure!(
            deep.iter().any(|path| path.file_name() == Some("c.json")),
            "recursive listing missed nested file"
        );
        Ok(())
    }

    #[test]
    fn missing_roots_surface_io_errors() -> Result<()> {
        let error = StdFileSystem
            .list(camino::Utf8Path::new("does-not-exist-conflux"), false)
            .err()
            .ok_or_else(|| anyhow!("missing root listed"))?;
        ensure!(
            error.to_string().contains("does-not-exist-conflux"),
            "path missing from: {error}"
        );
        Ok(())
    }
}
