//! Implementation of the `stratus dependents` command.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};

use stratus_lib::descriptor::parse_target;
use stratus_lib::impact::{FailureMode, ImpactOptions, dependents_of};

use crate::output::{print_failures, spinner};

/// Print the `BUILD` targets of `target` whose inputs include any of `paths`.
pub fn cmd_dependents(target: &str, paths: &[PathBuf], continue_on_error: bool) -> Result<ExitCode> {
  let (descriptor, t) = parse_target(target).with_context(|| format!("Failed to load target '{}'", target))?;

  let options = ImpactOptions {
    failure_mode: if continue_on_error {
      FailureMode::ContinueOnError
    } else {
      FailureMode::FailFast
    },
    parallel: true,
  };

  let progress = spinner(&format!("Evaluating sub-builds of {}", target));
  let report = dependents_of(&descriptor, &t, paths, options);
  progress.finish_and_clear();
  let report = report.with_context(|| format!("Failed to evaluate sub-builds of '{}'", target))?;

  print_failures(&report.failures);
  for dependent in &report.changed {
    println!("{}", dependent);
  }
  Ok(ExitCode::SUCCESS)
}
