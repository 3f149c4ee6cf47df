mod commands;

use clap::{CommandFactory, FromArgMatches, Parser, Subcommand};
use colored::Colorize;
use commands::{check, edit, show, CheckArgs, EditArgs, ShowArgs};
use std::path::PathBuf;

/// DDF CLI - inspect and edit schema-typed text-format documents
#[derive(Parser, Debug)]
#[command(name = "ddf")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Directory containing ddf.config.json (defaults to the current directory)
    #[arg(long, global = true)]
    config_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print a document in canonical form
    Show(ShowArgs),

    /// Verify a document round-trips and has every required field
    Check(CheckArgs),

    /// Apply edits to a document and save it
    Edit(EditArgs),
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    // Raw matches are kept so `edit` can recover the order of its flags
    let matches = Cli::command().get_matches();
    let cli = match Cli::from_arg_matches(&matches) {
        Ok(cli) => cli,
        Err(err) => err.exit(),
    };

    let result = cli
        .config_dir
        .map(Ok)
        .unwrap_or_else(std::env::current_dir)
        .map_err(anyhow::Error::from)
        .and_then(|config_dir| match cli.command {
            Command::Show(args) => show(args, &config_dir),
            Command::Check(args) => check(args, &config_dir),
            Command::Edit(args) => match matches.subcommand_matches("edit") {
                Some(edit_matches) => edit(args, edit_matches, &config_dir),
                None => Err(anyhow::anyhow!("Missing arguments for edit")),
            },
        });

    if let Err(err) = result {
        eprintln!();
        eprintln!("{} {:#}", "Error:".red().bold(), err);
        eprintln!();
        std::process::exit(1);
    }
}
