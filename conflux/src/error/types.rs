//! Primary error enum for configuration compilation and read access.

use std::sync::Arc;

use camino::Utf8PathBuf;
use thiserror::Error;

/// Pipeline stage in which a compile-time failure occurred.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[non_exhaustive]
pub enum CompileStage {
    /// Enumerating records and acquiring their raw data.
    Gather,
    /// Decoding acquired data into a tree.
    Decode,
    /// Combining a decoded tree into the running result.
    Merge,
    /// Substituting delimited references.
    Expand,
}

impl std::fmt::Display for CompileStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Gather => "gather",
            Self::Decode => "decode",
            Self::Merge => "merge",
            Self::Expand => "expand",
        };
        f.write_str(name)
    }
}

/// Errors that can occur while compiling or reading configuration.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ConfigError {
    /// Malformed source data.
    #[error("failed to decode '{source_name}'{}: {message}", position_suffix(*line, *column))]
    Decode {
        /// Record name the data was attributed to.
        source_name: String,
        /// One-based line of the failure, where the format reports one.
        line: Option<usize>,
        /// One-based column of the failure, where the format reports one.
        column: Option<usize>,
        /// Parser-reported description of the failure.
        message: String,
    },

    /// A `fail` directive was triggered during merge.
    #[error("merge conflict at '{path}': incoming value forbids merging")]
    Conflict {
        /// Delimited path of the offending key.
        path: String,
    },

    /// A path segment did not resolve against the tree.
    #[error("path '{path}' not found (resolved as far as '{resolved}')")]
    NotFound {
        /// The requested path.
        path: String,
        /// The prefix of the path that did resolve.
        resolved: String,
    },

    /// Two codecs or two records registered the same identity.
    #[error("duplicate registration of '{identity}'")]
    Duplicate {
        /// The extension or record name registered twice.
        identity: String,
    },

    /// The expansion cycle guard tripped.
    #[error("expanding '{path}' exceeded {limit} substitutions")]
    ExceededIterations {
        /// Path of the value whose expansion did not converge.
        path: String,
        /// Configured substitution cap.
        limit: usize,
    },

    /// A read or materialize operation ran before the first successful
    /// compile.
    #[error("configuration has not been compiled yet")]
    NotCompiled,

    /// Reading a file-backed record failed.
    #[error("failed to read '{path}'")]
    Io {
        /// The file that could not be read.
        path: Utf8PathBuf,
        /// Underlying filesystem error.
        #[source]
        source: std::io::Error,
    },

    /// Encoding a tree into serialized bytes failed.
    #[error("failed to encode as {format}: {message}")]
    Encode {
        /// Target format (codec extension).
        format: String,
        /// Encoder-reported description of the failure.
        message: String,
    },

    /// Materializing a subtree into a caller structure failed.
    #[error("failed to materialize '{path}': {message}")]
    Materialize {
        /// Path of the subtree being materialized.
        path: String,
        /// Deserializer-reported description of the failure.
        message: String,
    },

    /// A post-materialize hook rejected the populated structure.
    #[error("validation failed for '{key}': {message}")]
    Validation {
        /// Configuration key that failed validation.
        key: String,
        /// Human-readable explanation of the failure.
        message: String,
    },

    /// Wrapper tying a compile-time failure to its pipeline stage and the
    /// record being processed when it occurred.
    #[error("compile failed during {stage}{}: {cause}", record_suffix(record.as_deref()))]
    Compile {
        /// Stage the failure occurred in.
        stage: CompileStage,
        /// Record being processed, where one was in flight.
        record: Option<String>,
        /// The underlying failure.
        cause: Arc<ConfigError>,
    },
}

fn position_suffix(line: Option<usize>, column: Option<usize>) -> String {
    match (line, column) {
        (Some(l), Some(c)) => format!(" at line {l}, column {c}"),
        (Some(l), None) => format!(" at line {l}"),
        _ => String::new(),
    }
}

fn record_suffix(record: Option<&str>) -> String {
    record.map_or_else(String::new, |name| format!(" of record '{name}'"))
}
