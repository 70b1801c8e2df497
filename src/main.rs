mod cli;
mod commands;
mod paths;
mod progress;
mod runner;
mod ui;

use anyhow::Result;
use clap::{CommandFactory, Parser};
use clap_complete::generate;
use cli::{Cli, Command};
use std::io;

/// Global context for the application
pub struct Context {
    pub verbose: u8,
    pub quiet: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging based on verbosity
    let log_level = match cli.verbose {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        2 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };

    env_logger::Builder::new()
        .filter_level(if cli.quiet {
            log::LevelFilter::Error
        } else {
            log_level
        })
        .format_timestamp(None)
        .init();

    let ctx = Context {
        verbose: cli.verbose,
        quiet: cli.quiet,
    };
    log::trace!("verbosity {}", ctx.verbose);

    match cli.command {
        Command::Apply(args) => commands::apply::run(&ctx, args),
        Command::Diff(args) => commands::diff::run(&ctx, args),
        Command::Verify(args) => commands::verify::run(&ctx, args),
        Command::Init(args) => commands::init::run(&ctx, args),
        Command::Edit(args) => commands::edit::run(&ctx, args),
        Command::Completions { shell } => {
            let mut cmd = Cli::command();
            generate(shell, &mut cmd, "declarch", &mut io::stdout());
            Ok(())
        }
    }
}
