//! High-level operations.
//!
//! This module contains the implementation of capforge commands.

pub mod configure;
pub mod matrix_build;
pub mod matrix_init;

pub use configure::VariantConfigurator;
pub use matrix_build::{build, BuildOptions, MatrixDriver, MatrixRunError, MatrixState, Stage};
pub use matrix_init::{clean, init_project, InitOptions};
