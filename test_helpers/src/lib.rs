//! Test helpers shared across crates in the workspace.
//!
//! Provides environment variable guards and temporary configuration
//! directory fixtures.

pub mod env;
pub mod fixture;
