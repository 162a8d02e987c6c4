//! Error types produced by the configuration engine.

mod constructors;
mod types;

pub use types::{CompileStage, ConfigError};

use std::sync::Arc;

/// Convenient alias for results whose error is shared across callers.
///
/// Errors are wrapped in [`Arc`] so a failed compile can both be returned to
/// the caller and retained as the instance's last diagnostics without
/// cloning the underlying error.
pub type ConfigResult<T> = Result<T, Arc<ConfigError>>;
