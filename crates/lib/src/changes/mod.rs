//! Repository change sets.
//!
//! A [`ChangeSet`] holds the repository-relative paths touched between two
//! revisions, split by kind. [`git`] computes one from a git repository.

pub mod git;

use std::collections::BTreeSet;

use serde::Serialize;

pub use git::{ChangeSetProvider, GitChangeSetProvider, VcsError};

/// Paths added, modified and deleted between two revisions.
///
/// Paths are relative to the repository root and use `/` separators. A path
/// appears in at most one of the three sets.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ChangeSet {
  pub added: BTreeSet<String>,
  pub modified: BTreeSet<String>,
  pub deleted: BTreeSet<String>,
}

impl ChangeSet {
  /// Every changed path, regardless of kind.
  pub fn all(&self) -> BTreeSet<String> {
    self
      .added
      .iter()
      .chain(&self.modified)
      .chain(&self.deleted)
      .cloned()
      .collect()
  }

  pub fn is_empty(&self) -> bool {
    self.added.is_empty() && self.modified.is_empty() && self.deleted.is_empty()
  }

  pub fn len(&self) -> usize {
    self.added.len() + self.modified.len() + self.deleted.len()
  }
}
