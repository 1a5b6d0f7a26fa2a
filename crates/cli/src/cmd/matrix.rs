//! Implementation of the `stratus matrix` command.
//!
//! Evaluates the `BUILD` statements of a target against the git change set
//! and prints the sub-builds that need rebuilding, one per line or as a JSON
//! array suitable for a CI job matrix.

use std::path::Path;
use std::process::ExitCode;

use anyhow::{Context, Result};
use tracing::debug;

use stratus_lib::descriptor::parse_target;
use stratus_lib::impact::{FailureMode, ImpactEvaluator, ImpactOptions};

use super::GitRefs;
use crate::output::{append_github_output, print_failures, spinner};

pub fn cmd_matrix(
  target: &str,
  refs: &GitRefs,
  json: bool,
  continue_on_error: bool,
  github_output: Option<&Path>,
) -> Result<ExitCode> {
  let (descriptor, t) = parse_target(target).with_context(|| format!("Failed to load target '{}'", target))?;
  let (change_set, root) = refs.change_set(&descriptor.dir)?;
  let evaluator = ImpactEvaluator::from_change_set(&change_set, &root)?;

  let options = ImpactOptions {
    failure_mode: if continue_on_error {
      FailureMode::ContinueOnError
    } else {
      FailureMode::FailFast
    },
    parallel: true,
  };

  let progress = spinner(&format!("Evaluating sub-builds of {}", target));
  let report = evaluator.impacted_sub_builds(&descriptor, &t, options);
  progress.finish_and_clear();
  let report = report.with_context(|| format!("Failed to evaluate sub-builds of '{}'", target))?;

  print_failures(&report.failures);
  debug!(targets = ?report.changed, "targets with changed inputs");

  if !json {
    for changed in &report.changed {
      println!("{}", changed);
    }
    return Ok(ExitCode::SUCCESS);
  }

  let encoded = serde_json::to_string(&report.changed).context("Failed to serialize targets")?;
  println!("{}", encoded);

  if let Some(path) = github_output {
    debug!(path = %path.display(), "appending to GitHub output");
    append_github_output(path, "targets", &encoded)?;
  }

  Ok(ExitCode::SUCCESS)
}
