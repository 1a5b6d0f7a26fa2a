//! Types shared by copy collection and input expansion.

use std::collections::BTreeSet;
use std::path::PathBuf;

use thiserror::Error;

use crate::consts::TARGET_MARKER;
use crate::descriptor::{Descriptor, DescriptorError};

/// The deduplicated set of files a target depends on.
pub type InputSet = BTreeSet<PathBuf>;

/// Errors that can occur while resolving a target's inputs.
#[derive(Debug, Error)]
pub enum ResolveError {
  /// Loading an Earthfile or looking up a target failed.
  #[error(transparent)]
  Descriptor(#[from] DescriptorError),

  /// A referenced target could not be resolved.
  #[error("could not resolve target '{target}' from '{dir}': {source}")]
  Target {
    target: String,
    dir: PathBuf,
    #[source]
    source: Box<ResolveError>,
  },

  /// A copy source is not a valid glob pattern.
  #[error("could not glob pattern '{pattern}' in '{dir}': {source}")]
  Glob {
    pattern: String,
    dir: PathBuf,
    #[source]
    source: glob::PatternError,
  },

  /// A glob match could not be read.
  #[error("could not expand glob matches in '{dir}': {source}")]
  GlobEntry {
    dir: PathBuf,
    #[source]
    source: glob::GlobError,
  },

  /// Listing the files of a directory failed.
  #[error("could not list files in '{path}': {source}")]
  Walk {
    path: PathBuf,
    #[source]
    source: walkdir::Error,
  },

  /// A target depends on itself, directly or through other targets.
  #[error("cyclic target reference: {chain}")]
  CyclicReference { chain: String },

  /// Relative input paths could not be anchored.
  #[error("could not determine the current directory: {0}")]
  CurrentDir(#[source] std::io::Error),

  /// Evaluating one sub-build of a batch failed.
  #[error("could not evaluate '{target}': {source}")]
  SubBuild {
    target: String,
    #[source]
    source: Box<ResolveError>,
  },
}

/// Targets currently being resolved, outermost first.
///
/// Entering a target that is already on the stack means the references form a
/// cycle, which is reported instead of recursing forever.
#[derive(Debug, Default)]
pub struct ResolveStack {
  frames: Vec<(PathBuf, String)>,
}

impl ResolveStack {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn enter(&mut self, descriptor: &Descriptor, target: &str) -> Result<(), ResolveError> {
    let frame = (descriptor.path.clone(), target.to_string());
    if self.frames.contains(&frame) {
      let mut chain: Vec<String> = self.frames.iter().map(describe).collect();
      chain.push(describe(&frame));
      return Err(ResolveError::CyclicReference {
        chain: chain.join(" -> "),
      });
    }
    self.frames.push(frame);
    Ok(())
  }

  pub fn leave(&mut self) {
    self.frames.pop();
  }
}

fn describe((path, target): &(PathBuf, String)) -> String {
  let dir = path.parent().map(|p| p.display().to_string()).unwrap_or_default();
  format!("{}{}{}", dir, TARGET_MARKER, target)
}
