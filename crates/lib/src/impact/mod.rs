//! Change-impact evaluation.
//!
//! An [`ImpactEvaluator`] holds a set of changed files and answers whether a
//! target's inputs intersect it. Changed files and inputs are compared as
//! absolute paths with symlinked directories resolved: change sets are
//! anchored at the repository root and relative input paths at the current
//! directory.
//!
//! Batch queries look one level down: the `BUILD` statements of a target are
//! evaluated independently, optionally in parallel, and reported sorted.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use rayon::prelude::*;
use tracing::{debug, trace};

use crate::changes::ChangeSet;
use crate::collect::{BuildCmd, collect_build_commands};
use crate::descriptor::{Descriptor, Target};
use crate::inputs::{InputSet, ResolveError, target_inputs};
use crate::util::paths::{canonicalize_parent, join_clean, normalize_path};

/// What a batch does when one sub-build cannot be evaluated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FailureMode {
  /// Abort the batch with the first failing sub-build, in target order.
  #[default]
  FailFast,
  /// Evaluate every sub-build and report failures next to the results.
  ContinueOnError,
}

/// Options for batch evaluation.
#[derive(Debug, Clone, Copy)]
pub struct ImpactOptions {
  pub failure_mode: FailureMode,
  /// Evaluate sub-builds on the rayon thread pool.
  pub parallel: bool,
}

impl Default for ImpactOptions {
  fn default() -> Self {
    Self {
      failure_mode: FailureMode::FailFast,
      parallel: true,
    }
  }
}

/// A sub-build whose inputs could not be resolved.
#[derive(Debug)]
pub struct SubBuildFailure {
  /// The target as written in the `BUILD` statement.
  pub target: String,
  pub error: ResolveError,
}

/// Result of a batch evaluation.
#[derive(Debug, Default)]
pub struct ImpactReport {
  /// Sub-build targets with changed inputs, sorted and deduplicated.
  pub changed: Vec<String>,

  /// Only populated with [`FailureMode::ContinueOnError`]. One entry per
  /// target, sorted.
  pub failures: Vec<SubBuildFailure>,
}

/// Whether any input appears among the changed paths.
pub fn inputs_changed(inputs: &InputSet, changed: &BTreeSet<PathBuf>) -> bool {
  inputs.iter().any(|input| changed.contains(input))
}

/// Evaluates targets against a fixed set of changed files.
#[derive(Debug, Clone)]
pub struct ImpactEvaluator {
  changed: BTreeSet<PathBuf>,
  base: PathBuf,
}

impl ImpactEvaluator {
  /// Evaluator for a change set whose paths are relative to `repo_root`.
  pub fn from_change_set(change_set: &ChangeSet, repo_root: &Path) -> Result<Self, ResolveError> {
    let changed = change_set
      .all()
      .iter()
      .map(|p| canonicalize_parent(&join_clean(repo_root, p)))
      .collect();
    Self::with_changed(changed)
  }

  /// Evaluator for explicit paths, relative to the current directory.
  pub fn from_paths<I, P>(paths: I) -> Result<Self, ResolveError>
  where
    I: IntoIterator<Item = P>,
    P: AsRef<Path>,
  {
    let base = current_dir()?;
    let changed = paths
      .into_iter()
      .map(|p| canonicalize_parent(&join_clean(&base, p)))
      .collect();
    Ok(Self { changed, base })
  }

  fn with_changed(changed: BTreeSet<PathBuf>) -> Result<Self, ResolveError> {
    Ok(Self {
      changed,
      base: current_dir()?,
    })
  }

  /// Anchor relative inputs at `base` instead of the current directory.
  pub fn with_base(mut self, base: impl AsRef<Path>) -> Self {
    self.base = normalize_path(base.as_ref());
    self
  }

  pub fn changed_paths(&self) -> &BTreeSet<PathBuf> {
    &self.changed
  }

  /// Whether any of `inputs` is among the changed paths.
  ///
  /// Both sides are compared with symlinked directories resolved, so a
  /// target addressed through an alias of the repository still matches.
  pub fn inputs_changed(&self, inputs: &InputSet) -> bool {
    let anchored: InputSet = inputs
      .iter()
      .map(|p| canonicalize_parent(&join_clean(&self.base, p)))
      .collect();
    let hits: Vec<&PathBuf> = anchored.intersection(&self.changed).collect();
    if !hits.is_empty() {
      trace!(changed = ?hits, "changed inputs");
    }
    !hits.is_empty()
  }

  /// Whether the inputs of `target` intersect the changed paths.
  pub fn target_changed(&self, descriptor: &Arc<Descriptor>, target: &Target) -> Result<bool, ResolveError> {
    let inputs = target_inputs(descriptor, target)?;
    let changed = self.inputs_changed(&inputs);
    debug!(
      dir = %descriptor.dir.display(),
      target = %target.name,
      inputs = inputs.len(),
      changed,
      "evaluated target"
    );
    Ok(changed)
  }

  /// The `BUILD` targets of `target` whose inputs changed.
  ///
  /// Only the target's own `BUILD` statements are considered; their own
  /// sub-builds are not followed.
  pub fn impacted_sub_builds(
    &self,
    descriptor: &Arc<Descriptor>,
    target: &Target,
    options: ImpactOptions,
  ) -> Result<ImpactReport, ResolveError> {
    let builds = collect_build_commands(descriptor, target);
    debug!(target = %target.name, builds = builds.len(), parallel = options.parallel, "evaluating sub-builds");

    let mut outcomes: Vec<(String, Result<bool, ResolveError>)> = if options.parallel {
      builds.par_iter().map(|b| (b.target.clone(), self.sub_build_changed(b))).collect()
    } else {
      builds.iter().map(|b| (b.target.clone(), self.sub_build_changed(b))).collect()
    };
    outcomes.sort_by(|a, b| a.0.cmp(&b.0));

    let mut report = ImpactReport::default();
    for (name, outcome) in outcomes {
      match outcome {
        Ok(true) => report.changed.push(name),
        Ok(false) => {}
        Err(error) => match options.failure_mode {
          FailureMode::FailFast => {
            return Err(ResolveError::SubBuild {
              target: name,
              source: Box::new(error),
            });
          }
          FailureMode::ContinueOnError => report.failures.push(SubBuildFailure { target: name, error }),
        },
      }
    }
    report.changed.dedup();
    report.failures.dedup_by(|a, b| a.target == b.target);
    Ok(report)
  }

  fn sub_build_changed(&self, build: &BuildCmd) -> Result<bool, ResolveError> {
    let reference = build.descriptor.expand_args(&build.target);
    let (descriptor, target) = build.descriptor.target(&reference)?;
    self.target_changed(&descriptor, &target)
  }
}

/// The `BUILD` targets of `target` that read any of `paths`.
///
/// `paths` are relative to the current directory.
pub fn dependents_of<I, P>(
  descriptor: &Arc<Descriptor>,
  target: &Target,
  paths: I,
  options: ImpactOptions,
) -> Result<ImpactReport, ResolveError>
where
  I: IntoIterator<Item = P>,
  P: AsRef<Path>,
{
  ImpactEvaluator::from_paths(paths)?.impacted_sub_builds(descriptor, target, options)
}

fn current_dir() -> Result<PathBuf, ResolveError> {
  let cwd = std::env::current_dir().map_err(ResolveError::CurrentDir)?;
  Ok(dunce::canonicalize(&cwd).unwrap_or(cwd))
}
