//! Records: named configuration inputs and the snapshot they may observe.
//!
//! A record is one named unit of input to a compile. File-backed records
//! are read through the filesystem boundary; buffer and direct-value
//! records run a caller-supplied closure which receives a read-only
//! [`Snapshot`] of the tree merged so far, allowing later records to depend
//! on values contributed by earlier ones.

use std::sync::Arc;

use camino::Utf8PathBuf;

use crate::error::ConfigResult;
use crate::node::Node;
use crate::path::{KeyCase, resolve};

/// Closure yielding raw bytes for a buffer record.
pub(crate) type AcquireBytes =
    Arc<dyn Fn(&Snapshot<'_>) -> ConfigResult<Vec<u8>> + Send + Sync>;

/// Closure yielding a raw value for a direct-value record.
pub(crate) type AcquireRaw =
    Arc<dyn Fn(&Snapshot<'_>) -> ConfigResult<serde_json::Value> + Send + Sync>;

#[derive(Clone)]
pub(crate) enum RecordSource {
    File { path: Utf8PathBuf },
    Buffer { extension: String, acquire: AcquireBytes },
    Value { acquire: AcquireRaw },
}

#[derive(Clone)]
pub(crate) struct Record {
    pub(crate) name: String,
    pub(crate) default: bool,
    pub(crate) source: RecordSource,
}

impl std::fmt::Debug for Record {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let origin = match &self.source {
            RecordSource::File { path } => format!("file:{path}"),
            RecordSource::Buffer { extension, .. } => format!("buffer:{extension}"),
            RecordSource::Value { .. } => "value".to_owned(),
        };
        f.debug_struct("Record")
            .field("name", &self.name)
            .field("default", &self.default)
            .field("origin", &origin)
            .finish()
    }
}

impl Record {
    pub(crate) fn file(name: impl Into<String>, path: Utf8PathBuf, default: bool) -> Self {
        Self {
            name: name.into(),
            default,
            source: RecordSource::File { path },
        }
    }

    pub(crate) fn buffer(
        name: impl Into<String>,
        extension: impl Into<String>,
        acquire: AcquireBytes,
        default: bool,
    ) -> Self {
        Self {
            name: name.into(),
            default,
            source: RecordSource::Buffer {
                extension: extension.into(),
                acquire,
            },
        }
    }

    pub(crate) fn value(name: impl Into<String>, acquire: AcquireRaw, default: bool) -> Self {
        Self {
            name: name.into(),
            default,
            source: RecordSource::Value { acquire },
        }
    }
}

/// Read-only view of the tree merged so far, handed to buffer and
/// direct-value acquisition closures.
///
/// The snapshot borrows a private copy taken before the record runs; it is
/// never a live reference into the in-progress merge.
#[derive(Clone, Copy, Debug)]
pub struct Snapshot<'a> {
    tree: &'a Node,
    delimiter: &'a str,
    key_case: KeyCase,
}

impl<'a> Snapshot<'a> {
    pub(crate) const fn new(tree: &'a Node, delimiter: &'a str, key_case: KeyCase) -> Self {
        Self {
            tree,
            delimiter,
            key_case,
        }
    }

    /// The root of the tree merged so far.
    #[must_use]
    pub const fn root(&self) -> &'a Node {
        self.tree
    }

    /// Resolve a delimited path against the snapshot.
    ///
    /// # Errors
    ///
    /// Returns [`crate::ConfigError::NotFound`] when the path does not
    /// resolve.
    pub fn fetch(&self, path: &str) -> ConfigResult<&'a Node> {
        resolve(self.tree, path, self.delimiter, self.key_case)
    }

    /// The scalar at `path` rendered as text, when present.
    #[must_use]
    pub fn string(&self, path: &str) -> Option<String> {
        self.fetch(path)
            .ok()
            .and_then(Node::as_scalar)
            .map(ToString::to_string)
    }

    /// Whether `path` resolves against the snapshot.
    #[must_use]
    pub fn contains(&self, path: &str) -> bool {
        self.fetch(path).is_ok()
    }
}
