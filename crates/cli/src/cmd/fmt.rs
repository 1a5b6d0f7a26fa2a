//! Implementation of the `stratus fmt` command.

use std::fs;
use std::path::Path;
use std::process::ExitCode;

use anyhow::{Context, Result};
use tracing::debug;

use stratus_lib::descriptor::Descriptor;
use stratus_lib::descriptor::format::format_descriptor;

use super::negative;
use crate::output::{print_status, print_warning};

/// Print `file` in canonical formatting, or with `check` only report whether
/// it already is.
pub fn cmd_fmt(file: &Path, check: bool) -> Result<ExitCode> {
  let original = fs::read_to_string(file).with_context(|| format!("Failed to read '{}'", file.display()))?;
  let descriptor = Descriptor::from_source(file, &original)?;
  debug!(path = %descriptor.path.display(), "parsed Earthfile");

  let formatted = format_descriptor(&descriptor.spec);

  if !check {
    print!("{}", formatted);
    return Ok(ExitCode::SUCCESS);
  }

  if formatted == original {
    print_status(&format!("{} is formatted", file.display()));
    Ok(ExitCode::SUCCESS)
  } else {
    print_warning(&format!("{} is not formatted", file.display()));
    Ok(negative())
  }
}
