//! Extensions for mapping errors into `ConfigResult` concisely.
//!
//! These helpers reduce repetitive `.map_err(Arc::new)` patterns when
//! converting a plain [`ConfigError`] into the crate's
//! [`ConfigResult<T>`](crate::ConfigResult) alias
//! (`Result<T, Arc<ConfigError>>`).

use std::sync::Arc;

use crate::error::{ConfigError, ConfigResult};

/// Extension for mapping `Result<T, ConfigError>` into a shared
/// [`ConfigResult<T>`].
pub trait IntoShared<T> {
    /// Wrap the error side in an [`Arc`].
    ///
    /// # Errors
    ///
    /// Propagates the original error after wrapping it in `Arc`.
    fn into_shared(self) -> ConfigResult<T>;
}

impl<T> IntoShared<T> for Result<T, ConfigError> {
    fn into_shared(self) -> ConfigResult<T> {
        self.map_err(Arc::new)
    }
}
