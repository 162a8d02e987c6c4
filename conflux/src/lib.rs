//! Conflux: a configuration-compilation engine.
//!
//! Conflux gathers configuration fragments from independent sources
//! (files, in-memory buffers and programmatically injected values), decodes
//! each into a common tree, orders them deterministically and merges them
//! into one authoritative tree while recording where every value came
//! from. Inline directives embedded in source keys (`port((replace))`,
//! `token((secret))`) override the default merge policy; later records may
//! observe a read-only snapshot of the tree merged so far; delimited
//! references in values are expanded with cycle protection; and every
//! compile replaces the published tree atomically or not at all.
//!
//! # Quick start
//!
//! ```
//! use conflux::Compiler;
//! use serde_json::json;
//!
//! let compiler = Compiler::new();
//! compiler.add_value("base", |_| Ok(json!({"a": {"b": 1, "c": 2}})));
//! compiler.add_value("site", |_| Ok(json!({"a": {"b((replace))": 9, "d": 4}})));
//! compiler.compile()?;
//! assert_eq!(
//!     compiler.tree()?.to_value(),
//!     json!({"a": {"b": 9, "c": 2, "d": 4}}),
//! );
//! # Ok::<_, std::sync::Arc<conflux::ConfigError>>(())
//! ```

mod codec;
mod compile;
mod directive;
mod error;
mod expand;
mod fs;
mod materialize;
mod merge;
mod node;
mod order;
mod path;
mod record;
mod result_ext;

pub use codec::{Codec, CodecRegistry, DecodeContext, EncodeOptions, JsonCodec};
#[cfg(feature = "toml")]
pub use codec::TomlCodec;
#[cfg(feature = "yaml")]
pub use codec::YamlCodec;
pub use compile::{CompiledState, Compiler, CompilerBuilder};
pub use directive::{DirectiveError, DirectiveSet, MergePolicy, parse_key};
pub use error::{CompileStage, ConfigError, ConfigResult};
pub use expand::{DEFAULT_SUBSTITUTION_LIMIT, Expansion, Mapper};
pub use fs::{FileGroup, FileSystem, StdFileSystem};
pub use materialize::{PostMaterialize, materialize, materialize_validated};
pub use merge::merge;
pub use node::{Node, NodeKind, NodeValue, Origin, REDACTED, Scalar};
pub use order::{Comparator, RecordOrdering, natural_cmp};
pub use path::{KeyCase, resolve};
pub use record::Snapshot;
pub use result_ext::IntoShared;
