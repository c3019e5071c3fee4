//! `capforge build` command

use anyhow::Result;

use crate::cli::{BuildArgs, GlobalArgs, MessageFormat};
use crate::commands::load_manifest;
use capforge::ops::matrix_build::{build, BuildOptions};
use capforge::util::{GlobalContext, Shell};

pub fn execute(args: BuildArgs, global: &GlobalArgs) -> Result<()> {
    let ctx = GlobalContext::new()?;
    let manifest = load_manifest(&ctx, global)?;

    // Project config overrides global config
    let config = ctx.load_config(&manifest.manifest_dir);

    let shell = Shell::from_flags(
        global.quiet,
        global.verbose,
        global.color,
        args.message_format == MessageFormat::Json,
    );

    let opts = BuildOptions {
        // The toolchain runs in the project root, so pin relative paths to cwd.
        sdk_dir: args.sdk_dir.map(|dir| ctx.cwd().join(dir)),
        emit_plan: args.plan,
        restore_config: args.restore_config,
    };

    build(&manifest, &config, &opts, &shell)?;

    Ok(())
}
