//! capforge - build every variant of a feature-flagged applet
//!
//! A matrix of variants (artifact version, toolchain version, enabled
//! flags) is built one after another against a single shared configuration
//! document. Each variant's artifact is archived under a name that encodes
//! the variant.

pub mod builder;
pub mod core;
pub mod ops;
pub mod util;

/// Test utilities and mocks for capforge unit tests.
///
/// Only available when compiling tests. Provides a scripted toolchain and
/// fixtures for registries and configuration documents.
#[cfg(test)]
pub mod test_support;

pub use crate::core::{
    errors::MatrixError, flags::FlagRegistry, manifest::Manifest, variant::VariantSpec,
};
pub use crate::ops::{MatrixDriver, MatrixRunError};
pub use crate::util::context::GlobalContext;
