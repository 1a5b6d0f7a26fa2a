//! Implementation of the `stratus gocopies` command.
//!
//! Prints the `COPY` statements a Go package's Earthfile needs for its
//! module-internal imports, split into production and test-only blocks that
//! can be pasted into a `+src` style target.

use std::path::Path;
use std::process::ExitCode;

use anyhow::{Context, Result};

use stratus_lib::consts::APP_NAME;
use stratus_lib::godeps::{GoDepResolver, format_copy_commands};

pub fn cmd_gocopies(pkg: &Path, go_mod_dir: &Path, include_transitive: bool) -> Result<ExitCode> {
  let mut resolver = GoDepResolver::new(go_mod_dir)
    .with_context(|| format!("Failed to load Go module in '{}'", go_mod_dir.display()))?;

  let (copies, test_copies) = resolver
    .resolve_imports_to_copy_commands(pkg, include_transitive)
    .with_context(|| format!("Failed to resolve imports of '{}'", pkg.display()))?;

  let flag = if include_transitive { " --include-transitive " } else { " " };
  let invocation = format!("{}{}{}{}", APP_NAME, " gocopies", flag, pkg.display());

  println!();
  println!("# Go imports (generated with `{}`)", invocation);
  for line in format_copy_commands(&copies) {
    println!("{}", line);
  }

  println!();
  println!("# Go test imports (generated with `{}`)", invocation);
  for line in format_copy_commands(&test_copies) {
    println!("{}", line);
  }
  println!();

  Ok(ExitCode::SUCCESS)
}
