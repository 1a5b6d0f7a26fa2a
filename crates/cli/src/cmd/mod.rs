mod changed;
mod dependents;
mod fmt;
mod gocopies;
mod inspect;
mod matrix;

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Args;
use tracing::debug;

use stratus_lib::changes::{ChangeSet, ChangeSetProvider, GitChangeSetProvider};

pub use changed::cmd_changed;
pub use dependents::cmd_dependents;
pub use fmt::cmd_fmt;
pub use gocopies::cmd_gocopies;
pub use inspect::cmd_inspect;
pub use matrix::cmd_matrix;

/// Exit code for a negative answer.
pub(crate) fn negative() -> ExitCode {
  ExitCode::from(1)
}

/// The revisions a change set is computed between.
#[derive(Debug, Clone, Args)]
pub struct GitRefs {
  /// Base branch or ref to diff from
  #[arg(long, env = "GITHUB_BASE_REF", value_name = "REF")]
  pub from_ref: Option<String>,

  /// Commit to diff to
  #[arg(long, env = "GITHUB_SHA", value_name = "COMMIT", default_value = "HEAD")]
  pub to_commit: String,
}

impl GitRefs {
  /// Compute the change set of the repository containing `hint`, along with
  /// the repository root its paths are relative to.
  pub fn change_set(&self, hint: &Path) -> Result<(ChangeSet, PathBuf)> {
    let from_ref = self
      .from_ref
      .as_deref()
      .filter(|r| !r.is_empty())
      .context("Missing base ref: pass --from-ref or set GITHUB_BASE_REF")?;

    let provider = GitChangeSetProvider;
    let root = provider.repo_root(hint)?;
    debug!(root = %root.display(), "detected repository root");

    let change_set = provider.compute_change_set(hint, from_ref, &self.to_commit)?;
    debug!(added = ?change_set.added, "added files");
    debug!(modified = ?change_set.modified, "modified files");
    debug!(deleted = ?change_set.deleted, "deleted files");

    Ok((change_set, root))
  }
}
