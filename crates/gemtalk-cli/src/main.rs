// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Gemtalk command-line interface.
//!
//! This is the main entry point for the `gemtalk` command. Results go to
//! stdout; logs go to stderr.

use camino::Utf8PathBuf;
use clap::{ArgAction, Parser, Subcommand};
use miette::{IntoDiagnostic, Result, miette};
use tracing_subscriber::EnvFilter;

mod commands;
mod config;

use commands::refactor::{RefactorCommand, RunContext};
use config::OutputFormat;

/// Gemtalk: heuristic analysis and refactoring for Smalltalk methods
#[derive(Debug, Parser)]
#[command(name = "gemtalk")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Config file (default: nearest gemtalk.toml)
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<Utf8PathBuf>,

    /// Output format (overrides the config file)
    #[arg(long, global = true, value_enum)]
    format: Option<OutputFormat>,

    /// Example senders listed per warning (overrides the config file)
    #[arg(long, global = true, value_name = "N")]
    sender_examples: Option<usize>,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Split a method into statements and report its sends
    Analyze {
        /// File holding one method's source
        file: Utf8PathBuf,
    },

    /// Report the sends in a method
    Sends {
        /// File holding one method's source
        file: Utf8PathBuf,

        /// Only report sends of this selector
        #[arg(long)]
        selector: Option<String>,
    },

    #[command(flatten)]
    Refactor(RefactorCommand),
}

fn directive_for_verbosity(v: u8) -> &'static str {
    // Targets are crate module paths, so both crates are listed.
    match v {
        0 => "gemtalk=info,gemtalk_core=info",
        1 => "gemtalk=debug,gemtalk_core=debug",
        _ => "gemtalk=trace,gemtalk_core=trace",
    }
}

fn run(cli: Cli) -> Result<String> {
    let cwd = std::env::current_dir().into_diagnostic()?;
    let cwd = Utf8PathBuf::from_path_buf(cwd)
        .map_err(|path| miette!("Working directory is not UTF-8: {}", path.display()))?;
    let config = config::load(cli.config.as_deref(), &cwd)?;

    let format = cli.format.unwrap_or(config.output.format);
    let mut settings = config.refactor;
    if let Some(limit) = cli.sender_examples {
        settings.sender_example_limit = limit;
    }

    match cli.command {
        Command::Analyze { file } => commands::analyze::run_analyze(&file, format),
        Command::Sends { file, selector } => commands::analyze::run_sends(&file, selector.as_deref(), format),
        Command::Refactor(command) => command.run(&RunContext { settings, format }),
    }
}

fn main() -> Result<()> {
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .unicode(true)
                .context_lines(3)
                .build(),
        )
    }))?;

    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(directive_for_verbosity(cli.verbose))),
        )
        // stdout carries results; keep logs plain on stderr.
        .with_ansi(false)
        .with_writer(std::io::stderr)
        .init();

    match run(cli) {
        Ok(output) => {
            print!("{output}");
            if !output.ends_with('\n') {
                println!();
            }
            Ok(())
        }
        Err(e) => {
            eprintln!("{e:?}");
            std::process::exit(1);
        }
    }
}
