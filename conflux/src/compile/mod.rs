//! Compilation pipeline: gather, order, merge, expand, hash, publish.
//!
//! A [`Compiler`] owns everything a compile needs (codec registry,
//! filesystem handle, records, ordering, expansion passes and path syntax)
//! behind one coarse lock. Compiles are all-or-nothing: any failure leaves
//! the previously published [`CompiledState`] untouched and is retained as
//! the instance's last diagnostics.

mod builder;

pub use builder::CompilerBuilder;


use std::sync::Arc;

use camino::Utf8PathBuf;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::codec::{CodecRegistry, DecodeContext, EncodeOptions};
use crate::error::{CompileStage, ConfigError, ConfigResult};
use crate::expand::Expansion;
use crate::fs::{FileGroup, FileSystem};
use crate::materialize;
use crate::merge;
use crate::node::Node;
use crate::order::RecordOrdering;
use crate::path::{KeyCase, resolve};
use crate::record::{Record, RecordSource, Snapshot};

/// Immutable result of one successful compile.
#[derive(Clone, Debug)]
pub struct CompiledState {
    tree: Node,
    record_log: Vec<String>,
    hash: String,
    compiled_at: DateTime<Utc>,
}

impl CompiledState {
    /// The authoritative merged tree.
    #[must_use]
    pub const fn tree(&self) -> &Node {
        &self.tree
    }

    /// Record names in the order they were merged.
    #[must_use]
    pub fn record_log(&self) -> &[String] {
        &self.record_log
    }

    /// Structural content hash of the tree, as lowercase hex.
    #[must_use]
    pub fn hash(&self) -> &str {
        &self.hash
    }

    /// When this state was published.
    #[must_use]
    pub const fn compiled_at(&self) -> DateTime<Utc> {
        self.compiled_at
    }
}

pub(crate) struct Inner {
    pub(crate) registry: CodecRegistry,
    pub(crate) filesystem: Arc<dyn FileSystem>,
    pub(crate) ordering: RecordOrdering,
    pub(crate) expansions: Vec<Expansion>,
    pub(crate) delimiter: String,
    pub(crate) key_case: KeyCase,
    pub(crate) records: Vec<Record>,
    pub(crate) groups: Vec<FileGroup>,
    pub(crate) state: Option<CompiledState>,
    pub(crate) last_error: Option<Arc<ConfigError>>,
}

/// A configuration compiler instance.
///
/// All operations (registering sources, compiling, fetching,
/// materializing and encoding) serialize on one exclusive lock, so a
/// compile never interleaves with another operation on the same instance.
///
/// # Examples
///
/// ```
/// use conflux::Compiler;
/// use serde_json::json;
///
/// let compiler = Compiler::new();
/// compiler.add_value("defaults", |_| Ok(json!({"server": {"port": 80}})));
/// compiler.add_value("overrides", |_| Ok(json!({"server": {"port": 8080}})));
/// compiler.compile()?;
/// assert_eq!(
///     compiler.fetch("server.port")?.to_value(),
///     json!(8080),
/// );
/// # Ok::<_, std::sync::Arc<conflux::ConfigError>>(())
/// ```
pub struct Compiler {
    inner: Mutex<Inner>,
}

impl std::fmt::Debug for Compiler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.inner.lock();
        f.debug_struct("Compiler")
            .field("records", &inner.records.len())
            .field("groups", &inner.groups.len())
            .field("compiled", &inner.state.is_some())
            .finish_non_exhaustive()
    }
}

impl Default for Compiler {
    fn default() -> Self {
        Self::new()
    }
}

impl Compiler {
    /// A compiler with default settings: built-in codecs, the std
    /// filesystem, lexical ordering, `.` delimiter and case-sensitive keys.
    #[must_use]
    pub fn new() -> Self {
        CompilerBuilder::new().build()
    }

    /// Start configuring a compiler.
    #[must_use]
    pub fn builder() -> CompilerBuilder {
        CompilerBuilder::new()
    }

    pub(crate) const fn from_inner(inner: Mutex<Inner>) -> Self {
        Self { inner }
    }

    /// Register a file-backed record named after its path.
    pub fn add_file(&self, path: impl Into<Utf8PathBuf>) {
        self.push_file(path.into(), false);
    }

    /// Register a file-backed record merged before all non-default records.
    pub fn add_default_file(&self, path: impl Into<Utf8PathBuf>) {
        self.push_file(path.into(), true);
    }

    fn push_file(&self, path: Utf8PathBuf, default: bool) {
        let mut inner = self.inner.lock();
        inner
            .records
            .push(Record::file(path.as_str().to_owned(), path, default));
    }

    /// Register a buffer record decoded with the codec for `extension`.
    ///
    /// The closure receives a read-only snapshot of the tree merged so far
    /// and returns the raw bytes to decode.
    pub fn add_buffer(
        &self,
        name: impl Into<String>,
        extension: impl Into<String>,
        acquire: impl Fn(&Snapshot<'_>) -> ConfigResult<Vec<u8>> + Send + Sync + 'static,
    ) {
        let mut inner = self.inner.lock();
        inner
            .records
            .push(Record::buffer(name, extension, Arc::new(acquire), false));
    }

    /// Register a buffer record merged before all non-default records.
    pub fn add_default_buffer(
        &self,
        name: impl Into<String>,
        extension: impl Into<String>,
        acquire: impl Fn(&Snapshot<'_>) -> ConfigResult<Vec<u8>> + Send + Sync + 'static,
    ) {
        let mut inner = self.inner.lock();
        inner
            .records
            .push(Record::buffer(name, extension, Arc::new(acquire), true));
    }

    /// Register a direct-value record.
    ///
    /// The closure receives a read-only snapshot of the tree merged so far
    /// and returns a raw value; directive-bearing keys in it are honoured
    /// exactly as they would be in a decoded file.
    pub fn add_value(
        &self,
        name: impl Into<String>,
        acquire: impl Fn(&Snapshot<'_>) -> ConfigResult<serde_json::Value> + Send + Sync + 'static,
    ) {
        let mut inner = self.inner.lock();
        inner
            .records
            .push(Record::value(name, Arc::new(acquire), false));
    }

    /// Register a direct-value record merged before all non-default
    /// records.
    pub fn add_default_value(
        &self,
        name: impl Into<String>,
        acquire: impl Fn(&Snapshot<'_>) -> ConfigResult<serde_json::Value> + Send + Sync + 'static,
    ) {
        let mut inner = self.inner.lock();
        inner
            .records
            .push(Record::value(name, Arc::new(acquire), true));
    }

    /// Register a directory whose files become records at compile time.
    ///
    /// Files without a registered codec extension are skipped.
    pub fn add_file_group(&self, root: impl Into<Utf8PathBuf>, recursive: bool) {
        let mut inner = self.inner.lock();
        inner.groups.push(FileGroup::new(root.into(), recursive));
    }

    /// Run the full gather, order, merge, expand and hash pipeline.
    ///
    /// On success the new state is published atomically; on failure the
    /// previously published state, if any, is left completely unchanged
    /// and the error is retained as [`Compiler::last_error`].
    ///
    /// # Errors
    ///
    /// Returns the failure wrapped in [`ConfigError::Compile`], naming the
    /// stage and record it occurred in.
    pub fn compile(&self) -> ConfigResult<()> {
        let mut inner = self.inner.lock();
        match compile_locked(&inner) {
            Ok(state) => {
                debug!(
                    hash = %state.hash,
                    records = state.record_log.len(),
                    "published compiled configuration"
                );
                inner.state = Some(state);
                inner.last_error = None;
                Ok(())
            }
            Err(error) => {
                debug!(%error, "compile failed; previous state retained");
                inner.last_error = Some(Arc::clone(&error));
                Err(error)
            }
        }
    }

    /// Fetch a subtree of the compiled tree by delimited path.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::NotCompiled`] before the first successful
    /// compile and [`ConfigError::NotFound`] when the path does not
    /// resolve.
    pub fn fetch(&self, path: &str) -> ConfigResult<Node> {
        let inner = self.inner.lock();
        let state = compiled(&inner)?;
        resolve(&state.tree, path, &inner.delimiter, inner.key_case).map(Node::clone)
    }

    /// Clone the whole compiled tree.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::NotCompiled`] before the first successful
    /// compile.
    pub fn tree(&self) -> ConfigResult<Node> {
        let inner = self.inner.lock();
        compiled(&inner).map(|state| state.tree.clone())
    }

    /// The content hash of the compiled tree.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::NotCompiled`] before the first successful
    /// compile.
    pub fn hash(&self) -> ConfigResult<String> {
        let inner = self.inner.lock();
        compiled(&inner).map(|state| state.hash.clone())
    }

    /// Record names in the order the last compile merged them.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::NotCompiled`] before the first successful
    /// compile.
    pub fn record_log(&self) -> ConfigResult<Vec<String>> {
        let inner = self.inner.lock();
        compiled(&inner).map(|state| state.record_log.clone())
    }

    /// Clone the whole published state.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::NotCompiled`] before the first successful
    /// compile.
    pub fn compiled_state(&self) -> ConfigResult<CompiledState> {
        let inner = self.inner.lock();
        compiled(&inner).cloned()
    }

    /// Whether a compiled state has been published.
    #[must_use]
    pub fn is_compiled(&self) -> bool {
        self.inner.lock().state.is_some()
    }

    /// The diagnostics retained from the last failed compile, if any.
    #[must_use]
    pub fn last_error(&self) -> Option<Arc<ConfigError>> {
        self.inner.lock().last_error.clone()
    }

    /// Materialize the subtree at `path` into a caller structure.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::NotCompiled`] before the first successful
    /// compile, [`ConfigError::NotFound`] when the path does not resolve,
    /// and [`ConfigError::Materialize`] when the shape does not match.
    pub fn materialize<T: DeserializeOwned>(&self, path: &str) -> ConfigResult<T> {
        let inner = self.inner.lock();
        let state = compiled(&inner)?;
        let node = resolve(&state.tree, path, &inner.delimiter, inner.key_case)?;
        materialize::materialize(node, path)
    }

    /// Materialize the subtree at `path` and run its
    /// [`crate::PostMaterialize`] hook.
    ///
    /// # Errors
    ///
    /// As [`Compiler::materialize`], plus whatever error the hook raises.
    pub fn materialize_validated<T>(&self, path: &str) -> ConfigResult<T>
    where
        T: DeserializeOwned + materialize::PostMaterialize,
    {
        let inner = self.inner.lock();
        let state = compiled(&inner)?;
        let node = resolve(&state.tree, path, &inner.delimiter, inner.key_case)?;
        materialize::materialize_validated(node, path)
    }

    /// Encode the compiled tree with the codec registered for `extension`.
    ///
    /// Pass [`EncodeOptions::redact_secrets`] to mask secret values.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::NotCompiled`] before the first successful
    /// compile, [`ConfigError::Encode`] when no codec is registered for
    /// the extension or the tree cannot be represented in the format.
    pub fn encode(&self, extension: &str, options: &EncodeOptions) -> ConfigResult<Vec<u8>> {
        let inner = self.inner.lock();
        let state = compiled(&inner)?;
        let codec = inner.registry.get(extension).ok_or_else(|| {
            ConfigError::encode(extension, "no codec registered for extension").shared()
        })?;
        codec.encode(&state.tree, options)
    }
}

fn compiled(inner: &Inner) -> ConfigResult<&CompiledState> {
    inner
        .state
        .as_ref()
        .ok_or_else(|| ConfigError::NotCompiled.shared())
}

fn stage_error(stage: CompileStage, record: Option<&str>, cause: Arc<ConfigError>) -> Arc<ConfigError> {
    ConfigError::compile(stage, record.map(ToOwned::to_owned), cause).shared()
}

fn compile_locked(inner: &Inner) -> ConfigResult<CompiledState> {
    let records = gather(inner)?;
    let ordered = order_records(inner, records);
    debug!(records = ordered.len(), "compiling configuration");
    let (tree, record_log) = fold_records(inner, &ordered)?;
    let expanded = final_expand(inner, tree)?;
    let hash = expanded.content_hash();
    Ok(CompiledState {
        tree: expanded,
        record_log,
        hash,
        compiled_at: Utc::now(),
    })
}

/// Enumerate file-group records and append directly-registered ones.
fn gather(inner: &Inner) -> ConfigResult<Vec<Record>> {
    let mut records = Vec::new();
    for group in &inner.groups {
        let listed = inner
            .filesystem
            .list(&group.root, group.recursive)
            .map_err(|cause| stage_error(CompileStage::Gather, None, cause))?;
        for path in listed {
            if path
                .extension()
                .is_some_and(|extension| inner.registry.supports(extension))
            {
                records.push(Record::file(path.as_str().to_owned(), path, false));
            } else {
                debug!(%path, "skipping file with no registered codec");
            }
        }
    }
    records.extend(inner.records.iter().cloned());
    ensure_unique_names(&records)?;
    Ok(records)
}

fn ensure_unique_names(records: &[Record]) -> ConfigResult<()> {
    let mut seen = std::collections::HashSet::with_capacity(records.len());
    for record in records {
        if !seen.insert(record.name.as_str()) {
            return Err(stage_error(
                CompileStage::Gather,
                Some(record.name.as_str()),
                ConfigError::duplicate(record.name.clone()).shared(),
            ));
        }
    }
    Ok(())
}

/// Defaults first in registration order, then the comparator-sorted rest.
fn order_records(inner: &Inner, records: Vec<Record>) -> Vec<Record> {
    let (mut defaults, mut rest): (Vec<Record>, Vec<Record>) =
        records.into_iter().partition(|record| record.default);
    rest.sort_by(|a, b| inner.ordering.compare(&a.name, &b.name));
    defaults.extend(rest);
    defaults
}

fn fold_records(inner: &Inner, records: &[Record]) -> ConfigResult<(Node, Vec<String>)> {
    let mut running = Node::empty();
    let mut record_log = Vec::with_capacity(records.len());
    for record in records {
        let decoded = decode_record(inner, &running, record)?;
        running = merge::merge(&running, &decoded)
            .map_err(|cause| stage_error(CompileStage::Merge, Some(record.name.as_str()), cause))?;
        record_log.push(record.name.clone());
    }
    Ok((running, record_log))
}

/// Acquire and decode one record into a fresh tree.
fn decode_record(inner: &Inner, running: &Node, record: &Record) -> ConfigResult<Node> {
    match &record.source {
        RecordSource::File { path } => {
            let bytes = inner
                .filesystem
                .read(path)
                .map_err(|cause| stage_error(CompileStage::Gather, Some(record.name.as_str()), cause))?;
            decode_bytes(inner, record, path.extension().unwrap_or(""), &bytes)
        }
        RecordSource::Buffer { extension, acquire } => {
            let context = acquire_context(inner, running, record)?;
            let snapshot = Snapshot::new(&context, &inner.delimiter, inner.key_case);
            let bytes = acquire(&snapshot)
                .map_err(|cause| stage_error(CompileStage::Gather, Some(record.name.as_str()), cause))?;
            decode_bytes(inner, record, extension, &bytes)
        }
        RecordSource::Value { acquire } => {
            let context = acquire_context(inner, running, record)?;
            let snapshot = Snapshot::new(&context, &inner.delimiter, inner.key_case);
            let raw = acquire(&snapshot)
                .map_err(|cause| stage_error(CompileStage::Gather, Some(record.name.as_str()), cause))?;
            Node::from_value(&record.name, &raw)
                .map_err(|cause| stage_error(CompileStage::Decode, Some(record.name.as_str()), cause))
        }
    }
}

fn decode_bytes(
    inner: &Inner,
    record: &Record,
    extension: &str,
    bytes: &[u8],
) -> ConfigResult<Node> {
    let codec = inner.registry.get(extension).ok_or_else(|| {
        stage_error(
            CompileStage::Decode,
            Some(record.name.as_str()),
            ConfigError::decode(
                record.name.clone(),
                format!("no codec registered for extension '{extension}'"),
            )
            .shared(),
        )
    })?;
    let context = DecodeContext {
        source: &record.name,
        delimiter: &inner.delimiter,
    };
    codec
        .decode(&context, bytes)
        .map_err(|cause| stage_error(CompileStage::Decode, Some(record.name.as_str()), cause))
}

/// Expansion passes applied to a snapshot of the running tree, forming the
/// context a dependent record may observe.
fn acquire_context(inner: &Inner, running: &Node, record: &Record) -> ConfigResult<Node> {
    let mut context = running.clone();
    for expansion in &inner.expansions {
        context = expansion
            .apply(&context)
            .map_err(|cause| stage_error(CompileStage::Expand, Some(record.name.as_str()), cause))?;
    }
    Ok(context)
}

/// The final expansion passes over the complete tree, in registration
/// order.
fn final_expand(inner: &Inner, tree: Node) -> ConfigResult<Node> {
    let mut current = tree;
    for expansion in &inner.expansions {
        current = expansion
            .apply(&current)
            .map_err(|cause| stage_error(CompileStage::Expand, None, cause))?;
    }
    Ok(current)
}
