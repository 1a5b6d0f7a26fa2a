//! Implementation of the `stratus inspect` command.

use std::process::ExitCode;

use anyhow::{Context, Result};

use stratus_lib::inputs::analyze_target_deps;

use crate::output::render_tree;

/// Print the files `target` depends on, sorted, or as a tree with `pretty`.
pub fn cmd_inspect(target: &str, pretty: bool) -> Result<ExitCode> {
  let inputs = analyze_target_deps(target).with_context(|| format!("Failed to resolve inputs of '{}'", target))?;

  if pretty {
    print!("{}", render_tree(&inputs));
  } else {
    for input in &inputs {
      println!("{}", input.display());
    }
  }
  Ok(ExitCode::SUCCESS)
}
