//! Temporary configuration directory fixtures.

use anyhow::{Context, Result};
use camino::{Utf8Path, Utf8PathBuf};
use tempfile::TempDir;

/// A temporary directory seeded with named configuration files.
///
/// The directory and everything in it is removed when the fixture drops.
///
/// # Examples
///
/// ```
/// use conflux_test_helpers::fixture::ConfigDir;
///
/// let dir = ConfigDir::with_files(&[("app.json", "{\"a\": 1}")])?;
/// assert!(dir.path("app.json").as_std_path().exists());
/// # Ok::<_, anyhow::Error>(())
/// ```
pub struct ConfigDir {
    root: TempDir,
}

impl ConfigDir {
    /// Create an empty fixture directory.
    ///
    /// # Errors
    ///
    /// Returns an error when the temporary directory cannot be created.
    pub fn new() -> Result<Self> {
        let root = TempDir::new().context("creating fixture directory")?;
        Ok(Self { root })
    }

    /// Create a fixture directory seeded with `files` of (name, contents).
    ///
    /// Names may contain `/` separators; intermediate directories are
    /// created as needed.
    ///
    /// # Errors
    ///
    /// Returns an error when the directory or any file cannot be written.
    pub fn with_files(files: &[(&str, &str)]) -> Result<Self> {
        let fixture = Self::new()?;
        for (name, contents) in files {
            fixture.write(name, contents)?;
        }
        Ok(fixture)
    }

    /// Write (or overwrite) one file under the fixture root.
    ///
    /// # Errors
    ///
    /// Returns an error when the file or a parent directory cannot be
    /// written.
    pub fn write(&self, name: &str, contents: &str) -> Result<Utf8PathBuf> {
        let path = self.path(name);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent.as_std_path())
                .with_context(|| format!("creating {parent}"))?;
        }
        std::fs::write(path.as_std_path(), contents).with_context(|| format!("writing {path}"))?;
        Ok(path)
    }

    /// The fixture root as a UTF-8 path.
    ///
    /// Falls back to the current directory if the platform produced a
    /// non-UTF-8 temporary path, which does not happen on supported test
    /// platforms.
    #[must_use]
    pub fn root(&self) -> &Utf8Path {
        Utf8Path::from_path(self.root.path()).unwrap_or_else(|| Utf8Path::new("."))
    }

    /// The path of `name` under the fixture root.
    #[must_use]
    pub fn path(&self, name: &str) -> Utf8PathBuf {
        self.root().join(name)
    }
}
