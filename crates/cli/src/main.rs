//! stratus: Earthfile dependency analysis for CI.
//!
//! Exit codes: `0` for success or a positive answer, `1` for a negative
//! answer (no changed inputs, unformatted file) and `2` when the operation
//! failed.

mod cmd;
mod output;

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{ArgAction, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use cmd::GitRefs;
use output::print_error;

/// Exit code for a failed operation.
const EXIT_FAILURE: u8 = 2;

#[derive(Parser)]
#[command(name = "stratus")]
#[command(author, version, about = "Analyze Earthfile targets: inputs, changes and rebuild matrices", long_about = None)]
struct Cli {
  /// Change to this directory before doing anything else
  #[arg(long, global = true, value_name = "DIR")]
  chdir: Option<PathBuf>,

  /// Increase log verbosity (-v debug, -vv trace); RUST_LOG overrides
  #[arg(short, long, global = true, action = ArgAction::Count)]
  verbose: u8,

  #[command(subcommand)]
  command: Commands,
}

#[derive(Subcommand)]
enum Commands {
  /// Exit with 0 if the target has changed input files, 1 otherwise
  Changed {
    /// Target path, e.g. `services/api+build`
    target: String,

    #[command(flatten)]
    refs: GitRefs,
  },

  /// Print the BUILD targets of a target that have changed inputs
  Matrix {
    /// Target path whose BUILD statements are evaluated
    target: String,

    /// Print a JSON array (also appended to $GITHUB_OUTPUT when set)
    #[arg(long)]
    json: bool,

    /// Report sub-builds that fail to resolve instead of aborting
    #[arg(long)]
    continue_on_error: bool,

    #[command(flatten)]
    refs: GitRefs,

    /// CI output file receiving `targets=<json>`
    #[arg(long, env = "GITHUB_OUTPUT", hide = true)]
    github_output: Option<PathBuf>,
  },

  /// Show which source files a target depends on
  #[command(visible_alias = "inputs")]
  Inspect {
    /// Target path
    target: String,

    /// Print the files as a tree
    #[arg(long)]
    pretty: bool,
  },

  /// Print the BUILD targets of a target that read any of the given files
  Dependents {
    /// Target path whose BUILD statements are evaluated
    target: String,

    /// Changed files, relative to the current directory
    #[arg(required = true)]
    paths: Vec<PathBuf>,

    /// Report sub-builds that fail to resolve instead of aborting
    #[arg(long)]
    continue_on_error: bool,
  },

  /// Print the COPY statements a Go package's Earthfile needs for its internal imports
  Gocopies {
    /// Package directory
    pkg: PathBuf,

    /// Directory containing go.mod
    #[arg(long, default_value = ".")]
    go_mod_dir: PathBuf,

    /// Also include imports of imported internal packages
    #[arg(long)]
    include_transitive: bool,
  },

  /// Print an Earthfile in canonical formatting
  #[command(visible_alias = "format")]
  Fmt {
    /// Earthfile to format
    file: PathBuf,

    /// Exit with 1 if the file is not formatted instead of printing it
    #[arg(long)]
    check: bool,
  },
}

fn main() -> ExitCode {
  let cli = Cli::parse();
  init_tracing(cli.verbose);

  match run(cli) {
    Ok(code) => code,
    Err(err) => {
      print_error(&format!("{err:#}"));
      ExitCode::from(EXIT_FAILURE)
    }
  }
}

fn init_tracing(verbose: u8) {
  let default_level = match verbose {
    0 => "warn",
    1 => "debug",
    _ => "trace",
  };
  let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

  tracing_subscriber::fmt()
    .with_env_filter(filter)
    .with_writer(std::io::stderr)
    .with_target(false)
    .without_time()
    .init();
}

fn run(cli: Cli) -> Result<ExitCode> {
  if let Some(dir) = &cli.chdir {
    std::env::set_current_dir(dir).with_context(|| format!("Failed to change directory to '{}'", dir.display()))?;
  }

  match cli.command {
    Commands::Changed { target, refs } => cmd::cmd_changed(&target, &refs),
    Commands::Matrix {
      target,
      json,
      continue_on_error,
      refs,
      github_output,
    } => cmd::cmd_matrix(&target, &refs, json, continue_on_error, github_output.as_deref()),
    Commands::Inspect { target, pretty } => cmd::cmd_inspect(&target, pretty),
    Commands::Dependents {
      target,
      paths,
      continue_on_error,
    } => cmd::cmd_dependents(&target, &paths, continue_on_error),
    Commands::Gocopies {
      pkg,
      go_mod_dir,
      include_transitive,
    } => cmd::cmd_gocopies(&pkg, &go_mod_dir, include_transitive),
    Commands::Fmt { file, check } => cmd::cmd_fmt(&file, check),
  }
}
