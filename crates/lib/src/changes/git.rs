//! Change sets computed from git history.
//!
//! The base revision is usually a branch name (`main`, or `GITHUB_BASE_REF` in
//! CI) and the head revision a commit id. Both are resolved with git's revision
//! syntax, so tags, `HEAD~1` and abbreviated ids work as well. A base branch
//! that only exists as a remote-tracking branch is found under `origin/`.

use std::path::{Path, PathBuf};

use gix::diff::tree_with_rewrites::Change;
use thiserror::Error;
use tracing::{debug, trace};

use super::ChangeSet;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Errors that can occur while computing a change set.
#[derive(Debug, Error)]
pub enum VcsError {
  /// No repository contains the given path.
  #[error("could not detect git repo from path '{path}': {source}")]
  Discover {
    path: PathBuf,
    #[source]
    source: BoxError,
  },

  /// The repository has no working tree to anchor paths at.
  #[error("repository at '{0}' has no working tree")]
  Bare(PathBuf),

  /// A revision could not be resolved to a commit.
  #[error("revision '{rev}' not found: {source}")]
  RevisionNotFound {
    rev: String,
    #[source]
    source: BoxError,
  },

  /// The tree of a resolved commit could not be read.
  #[error("could not read tree of '{rev}': {source}")]
  Tree {
    rev: String,
    #[source]
    source: BoxError,
  },

  /// Comparing the two trees failed.
  #[error("could not diff '{from}' against '{to}': {source}")]
  Diff {
    from: String,
    to: String,
    #[source]
    source: BoxError,
  },
}

/// Source of change sets between two revisions.
pub trait ChangeSetProvider {
  /// Root of the working tree of the repository containing `hint`.
  fn repo_root(&self, hint: &Path) -> Result<PathBuf, VcsError>;

  /// Paths changed between `from_ref` and `to_ref` in the repository containing `hint`.
  fn compute_change_set(&self, hint: &Path, from_ref: &str, to_ref: &str) -> Result<ChangeSet, VcsError>;
}

/// [`ChangeSetProvider`] backed by a local git repository.
#[derive(Debug, Clone, Copy, Default)]
pub struct GitChangeSetProvider;

impl ChangeSetProvider for GitChangeSetProvider {
  fn repo_root(&self, hint: &Path) -> Result<PathBuf, VcsError> {
    let repo = open(hint)?;
    workdir(&repo)
  }

  fn compute_change_set(&self, hint: &Path, from_ref: &str, to_ref: &str) -> Result<ChangeSet, VcsError> {
    let repo = open(hint)?;
    debug!(repo = %repo.git_dir().display(), from = from_ref, to = to_ref, "computing change set");

    let old = resolve_tree(&repo, from_ref, true)?;
    let new = resolve_tree(&repo, to_ref, false)?;

    let changes = repo
      .diff_tree_to_tree(Some(&old), Some(&new), None)
      .map_err(|e| VcsError::Diff {
        from: from_ref.to_string(),
        to: to_ref.to_string(),
        source: Box::new(e),
      })?;

    let mut set = ChangeSet::default();
    for change in changes {
      record(&mut set, change);
    }

    debug!(
      added = set.added.len(),
      modified = set.modified.len(),
      deleted = set.deleted.len(),
      "computed change set"
    );
    Ok(set)
  }
}

fn open(hint: &Path) -> Result<gix::Repository, VcsError> {
  gix::discover(hint).map_err(|e| VcsError::Discover {
    path: hint.to_path_buf(),
    source: Box::new(e),
  })
}

fn workdir(repo: &gix::Repository) -> Result<PathBuf, VcsError> {
  let dir = repo
    .workdir()
    .ok_or_else(|| VcsError::Bare(repo.git_dir().to_path_buf()))?;
  Ok(dunce::canonicalize(dir).unwrap_or_else(|_| dir.to_path_buf()))
}

fn resolve_tree<'repo>(repo: &'repo gix::Repository, rev: &str, try_remote: bool) -> Result<gix::Tree<'repo>, VcsError> {
  let id = match repo.rev_parse_single(rev) {
    Ok(id) => id,
    Err(e) if try_remote => {
      let remote = format!("origin/{rev}");
      trace!(rev, remote = %remote, "falling back to remote-tracking branch");
      repo.rev_parse_single(remote.as_str()).map_err(|_| VcsError::RevisionNotFound {
        rev: rev.to_string(),
        source: Box::new(e),
      })?
    }
    Err(e) => {
      return Err(VcsError::RevisionNotFound {
        rev: rev.to_string(),
        source: Box::new(e),
      });
    }
  };

  let commit = id
    .object()
    .map_err(|e| VcsError::RevisionNotFound {
      rev: rev.to_string(),
      source: Box::new(e),
    })?
    .peel_to_commit()
    .map_err(|e| VcsError::RevisionNotFound {
      rev: rev.to_string(),
      source: Box::new(e),
    })?;

  commit.tree().map_err(|e| VcsError::Tree {
    rev: rev.to_string(),
    source: Box::new(e),
  })
}

fn record(set: &mut ChangeSet, change: Change) {
  match change {
    Change::Addition {
      location, entry_mode, ..
    } if !entry_mode.is_tree() => {
      set.added.insert(location.to_string());
    }
    Change::Deletion {
      location, entry_mode, ..
    } if !entry_mode.is_tree() => {
      set.deleted.insert(location.to_string());
    }
    Change::Modification {
      location, entry_mode, ..
    } if !entry_mode.is_tree() => {
      set.modified.insert(location.to_string());
    }
    Change::Rewrite {
      source_location,
      location,
      entry_mode,
      copy,
      ..
    } if !entry_mode.is_tree() => {
      if !copy {
        set.deleted.insert(source_location.to_string());
      }
      set.added.insert(location.to_string());
    }
    _ => {}
  }
}
