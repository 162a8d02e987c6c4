//! Constructor helpers for [`ConfigError`].

use std::sync::Arc;

use camino::Utf8PathBuf;

use super::{CompileStage, ConfigError};

impl ConfigError {
    /// Construct a decode error with no position information.
    ///
    /// # Examples
    ///
    /// ```
    /// use conflux::ConfigError;
    /// let e = ConfigError::decode("site.json", "unexpected token");
    /// assert!(matches!(e, ConfigError::Decode { .. }));
    /// ```
    #[must_use]
    pub fn decode(source_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Decode {
            source_name: source_name.into(),
            line: None,
            column: None,
            message: message.into(),
        }
    }

    /// Construct a decode error attributed to a position in the source.
    #[must_use]
    pub fn decode_at(
        source_name: impl Into<String>,
        line: Option<usize>,
        column: Option<usize>,
        message: impl Into<String>,
    ) -> Self {
        Self::Decode {
            source_name: source_name.into(),
            line,
            column,
            message: message.into(),
        }
    }

    /// Construct a conflict error for the given delimited path.
    #[must_use]
    pub fn conflict(path: impl Into<String>) -> Self {
        Self::Conflict { path: path.into() }
    }

    /// Construct a not-found error retaining the resolved prefix.
    #[must_use]
    pub fn not_found(path: impl Into<String>, resolved: impl Into<String>) -> Self {
        Self::NotFound {
            path: path.into(),
            resolved: resolved.into(),
        }
    }

    /// Construct a duplicate-registration error.
    #[must_use]
    pub fn duplicate(identity: impl Into<String>) -> Self {
        Self::Duplicate {
            identity: identity.into(),
        }
    }

    /// Construct an exceeded-iterations error for the expansion cycle guard.
    #[must_use]
    pub fn exceeded_iterations(path: impl Into<String>, limit: usize) -> Self {
        Self::ExceededIterations {
            path: path.into(),
            limit,
        }
    }

    /// Construct an I/O error for a file-backed record.
    #[must_use]
    pub fn io(path: impl Into<Utf8PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Construct an encode error for the given format.
    #[must_use]
    pub fn encode(format: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Encode {
            format: format.into(),
            message: message.into(),
        }
    }

    /// Construct a materialize error for the given path.
    #[must_use]
    pub fn materialize(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Materialize {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Construct a validation error for the given key.
    #[must_use]
    pub fn validation(key: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            key: key.into(),
            message: message.into(),
        }
    }

    /// Wrap a failure with the compile stage and record it occurred in.
    #[must_use]
    pub fn compile(stage: CompileStage, record: Option<String>, cause: Arc<Self>) -> Self {
        Self::Compile {
            stage,
            record,
            cause,
        }
    }

    /// Wrap this error in an [`Arc`] for use as a [`crate::ConfigResult`]
    /// error.
    #[must_use]
    pub fn shared(self) -> Arc<Self> {
        Arc::new(self)
    }
}
