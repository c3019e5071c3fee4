//! `capforge flags` command

use anyhow::Result;

use crate::cli::{FlagsArgs, GlobalArgs};
use crate::commands::load_manifest;
use capforge::util::GlobalContext;

pub fn execute(_args: FlagsArgs, global: &GlobalArgs) -> Result<()> {
    let ctx = GlobalContext::new()?;
    let manifest = load_manifest(&ctx, global)?;

    if manifest.registry.is_empty() {
        println!("no flags registered in [flags]");
        return Ok(());
    }

    println!("FLAG  SYMBOL");
    for flag in manifest.registry.iter() {
        println!("{:<4}  {}", flag.abbreviation, flag.symbol);
    }

    Ok(())
}
