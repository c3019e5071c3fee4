//! `capforge init` command

use anyhow::Result;

use crate::cli::{GlobalArgs, InitArgs};
use capforge::ops::matrix_init::{init_project, InitOptions};
use capforge::util::shell::Status;
use capforge::util::{GlobalContext, Shell};

pub fn execute(args: InitArgs, global: &GlobalArgs) -> Result<()> {
    let ctx = GlobalContext::new()?;
    let shell = Shell::from_flags(global.quiet, global.verbose, global.color, false);

    let path = init_project(ctx.cwd(), &InitOptions { name: args.name })?;
    shell.status(Status::Created, path.display());

    Ok(())
}
