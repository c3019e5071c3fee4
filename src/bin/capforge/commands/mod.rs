//! Command implementations

pub mod build;
pub mod clean;
pub mod completions;
pub mod flags;
pub mod init;

use anyhow::Result;

use crate::cli::GlobalArgs;
use capforge::core::Manifest;
use capforge::util::GlobalContext;

/// Locate and load the manifest named by `--manifest-path`, or search for one.
pub fn load_manifest(ctx: &GlobalContext, global: &GlobalArgs) -> Result<Manifest> {
    let path = ctx.manifest_path(global.manifest_path.as_deref())?;
    Ok(Manifest::load(&path)?)
}
