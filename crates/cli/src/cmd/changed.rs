//! Implementation of the `stratus changed` command.

use std::process::ExitCode;

use anyhow::{Context, Result};

use stratus_lib::descriptor::parse_target;
use stratus_lib::impact::ImpactEvaluator;

use super::{GitRefs, negative};
use crate::output::{print_status, print_warning};

/// Exit with success when `target` has changed inputs between the given refs.
pub fn cmd_changed(target: &str, refs: &GitRefs) -> Result<ExitCode> {
  let (descriptor, t) = parse_target(target).with_context(|| format!("Failed to load target '{}'", target))?;
  let (change_set, root) = refs.change_set(&descriptor.dir)?;

  let evaluator = ImpactEvaluator::from_change_set(&change_set, &root)?;
  let changed = evaluator
    .target_changed(&descriptor, &t)
    .with_context(|| format!("Failed to resolve inputs of '{}'", target))?;

  if changed {
    print_status(&format!("Earthly target '{}' has changed inputs", target));
    Ok(ExitCode::SUCCESS)
  } else {
    print_warning(&format!("Earthly target '{}' has no input changes", target));
    Ok(negative())
  }
}
