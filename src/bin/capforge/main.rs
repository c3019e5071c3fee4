//! capforge CLI - build every variant of a feature-flagged applet

use anyhow::Result;
use clap::Parser;
use std::io::IsTerminal;
use tracing_subscriber::EnvFilter;

mod cli;
mod commands;

use capforge::core::errors::MatrixError;
use capforge::ops::MatrixRunError;
use capforge::util::diagnostic::emit;
use capforge::util::shell::ColorChoice;
use cli::{Cli, Commands};

fn main() {
    let cli = Cli::parse();
    let color = match cli.global.color {
        ColorChoice::Always => true,
        ColorChoice::Never => false,
        ColorChoice::Auto => std::io::stderr().is_terminal(),
    };

    if let Err(e) = run(cli) {
        report(&e, color);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    // Set up logging
    let filter = if cli.global.verbose {
        EnvFilter::new("capforge=debug")
    } else if cli.global.quiet {
        EnvFilter::new("capforge=warn")
    } else {
        EnvFilter::new("capforge=info")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr)
        .init();

    let global = cli.global;
    match cli.command {
        Commands::Build(args) => commands::build::execute(args, &global),
        Commands::Flags(args) => commands::flags::execute(args, &global),
        Commands::Init(args) => commands::init::execute(args, &global),
        Commands::Clean(args) => commands::clean::execute(args, &global),
        Commands::Completions(args) => commands::completions::execute(args),
    }
}

fn report(err: &anyhow::Error, color: bool) {
    if let Some(run) = err.downcast_ref::<MatrixRunError>() {
        emit(&run.to_diagnostic(), color);
    } else if let Some(matrix) = err.downcast_ref::<MatrixError>() {
        emit(&matrix.to_diagnostic(), color);
    } else {
        eprintln!("error: {:#}", err);
    }
}
