//! Builder for [`Compiler`] instances.

use std::sync::Arc;

use parking_lot::Mutex;

use crate::codec::CodecRegistry;
use crate::expand::Expansion;
use crate::fs::{FileSystem, StdFileSystem};
use crate::order::RecordOrdering;
use crate::path::KeyCase;

use super::{Compiler, Inner};

/// Configures and builds a [`Compiler`].
///
/// # Examples
///
/// ```
/// use conflux::{Compiler, Expansion, KeyCase, RecordOrdering};
///
/// let compiler = Compiler::builder()
///     .with_ordering(RecordOrdering::Natural)
///     .with_delimiter(".")
///     .with_key_case(KeyCase::Insensitive)
///     .add_expansion(Expansion::environment())
///     .build();
/// compiler.add_value("inline", |_| Ok(serde_json::json!({"a": 1})));
/// compiler.compile()?;
/// # Ok::<_, std::sync::Arc<conflux::ConfigError>>(())
/// ```
pub struct CompilerBuilder {
    registry: CodecRegistry,
    filesystem: Arc<dyn FileSystem>,
    ordering: RecordOrdering,
    expansions: Vec<Expansion>,
    delimiter: String,
    key_case: KeyCase,
}

impl std::fmt::Debug for CompilerBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompilerBuilder")
            .field("registry", &self.registry)
            .field("ordering", &self.ordering)
            .field("expansions", &self.expansions.len())
            .field("delimiter", &self.delimiter)
            .field("key_case", &self.key_case)
            .finish_non_exhaustive()
    }
}

impl Default for CompilerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl CompilerBuilder {
    /// A builder with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self {
            registry: CodecRegistry::with_defaults(),
            filesystem: Arc::new(StdFileSystem),
            ordering: RecordOrdering::default(),
            expansions: Vec::new(),
            delimiter: ".".to_owned(),
            key_case: KeyCase::default(),
        }
    }

    /// Replace the codec registry.
    #[must_use]
    pub fn with_registry(mut self, registry: CodecRegistry) -> Self {
        self.registry = registry;
        self
    }

    /// Replace the filesystem boundary.
    #[must_use]
    pub fn with_filesystem(mut self, filesystem: Arc<dyn FileSystem>) -> Self {
        self.filesystem = filesystem;
        self
    }

    /// Select the record ordering.
    #[must_use]
    pub fn with_ordering(mut self, ordering: RecordOrdering) -> Self {
        self.ordering = ordering;
        self
    }

    /// Append an expansion pass; passes run in registration order.
    #[must_use]
    pub fn add_expansion(mut self, expansion: Expansion) -> Self {
        self.expansions.push(expansion);
        self
    }

    /// Replace the key-path delimiter (default `.`).
    #[must_use]
    pub fn with_delimiter(mut self, delimiter: impl Into<String>) -> Self {
        self.delimiter = delimiter.into();
        self
    }

    /// Select the key-case normalization for map lookups.
    #[must_use]
    pub fn with_key_case(mut self, key_case: KeyCase) -> Self {
        self.key_case = key_case;
        self
    }

    /// Build the compiler.
    #[must_use]
    pub fn build(self) -> Compiler {
        Compiler::from_inner(Mutex::new(Inner {
            registry: self.registry,
            filesystem: self.filesystem,
            ordering: self.ordering,
            expansions: self.expansions,
            delimiter: self.delimiter,
            key_case: self.key_case,
            records: Vec::new(),
            groups: Vec::new(),
            state: None,
            last_error: None,
        }))
    }
}
