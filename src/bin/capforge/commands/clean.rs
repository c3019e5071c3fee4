//! `capforge clean` command

use anyhow::Result;

use crate::cli::{CleanArgs, GlobalArgs};
use crate::commands::load_manifest;
use capforge::ops::matrix_init::clean;
use capforge::util::shell::Status;
use capforge::util::{GlobalContext, Shell};

pub fn execute(_args: CleanArgs, global: &GlobalArgs) -> Result<()> {
    let ctx = GlobalContext::new()?;
    let manifest = load_manifest(&ctx, global)?;
    let shell = Shell::from_flags(global.quiet, global.verbose, global.color, false);

    if clean(&manifest)? {
        shell.status(Status::Removed, manifest.output_dir().display());
    } else {
        shell.note("nothing to clean");
    }

    Ok(())
}
