//! Parsed Earthfiles and target resolution.
//!
//! A [`Descriptor`] is one Earthfile on disk: its directory, the global `ARG`
//! bindings declared in its base recipe and its named targets. Target
//! references take two forms:
//! - `+name` names a target of the current Earthfile
//! - `dir+name` names a target of the Earthfile in `dir`, relative to the
//!   current Earthfile's directory
//!
//! Descriptors are immutable once parsed and are re-parsed on every load.

pub mod ast;
pub mod format;
pub mod locate;
pub mod parser;
pub mod walk;

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use thiserror::Error;
use tracing::debug;

pub use ast::{Command, DescriptorSpec, Recipe, Statement, Target};
pub use parser::SyntaxError;
pub use walk::{StmtVisitor, walk_recipe};

use crate::consts::{DESCRIPTOR_FILE_NAME, TARGET_MARKER};
use crate::util::paths::join_clean;

/// Errors raised while loading Earthfiles or looking up targets.
#[derive(Debug, Error)]
pub enum DescriptorError {
  /// The Earthfile could not be read.
  #[error("failed to read '{path}': {source}")]
  Read {
    path: PathBuf,
    #[source]
    source: io::Error,
  },

  /// The Earthfile is not syntactically valid.
  #[error("failed to parse '{path}': {source}")]
  Syntax {
    path: PathBuf,
    #[source]
    source: SyntaxError,
  },

  /// A global `ARG` does not have the `NAME = VALUE` shape.
  #[error("{path}: unexpected ARG syntax: {args:?}")]
  ArgSyntax { path: PathBuf, args: Vec<String> },

  /// A referenced directory has no Earthfile.
  #[error("could not stat '{path}': {source}")]
  DescriptorNotFound {
    path: PathBuf,
    #[source]
    source: io::Error,
  },

  /// The target is not declared in the Earthfile.
  #[error("local target '{name}' not found in '{path}'. available targets: {available}")]
  TargetNotFound {
    name: String,
    path: PathBuf,
    available: String,
  },

  /// A target path without the `+` marker.
  #[error("invalid target reference '{0}'")]
  InvalidTargetPath(String),

  /// No Earthfile exists in a directory or any of its parents.
  #[error("no Earthfile found in or above '{0}'")]
  NoDescriptorAbove(PathBuf),

  /// A directory is not below the root it was searched under.
  #[error("'{dir}' is not inside '{root}'")]
  OutsideRoot { dir: PathBuf, root: PathBuf },
}

/// One parsed Earthfile.
#[derive(Debug, Clone)]
pub struct Descriptor {
  /// Directory containing the Earthfile.
  pub dir: PathBuf,

  /// Path of the Earthfile itself.
  pub path: PathBuf,

  pub spec: DescriptorSpec,

  /// Global `ARG` bindings of the base recipe (last declaration wins).
  pub globals: BTreeMap<String, String>,
}

impl Descriptor {
  /// Read and parse the Earthfile at `path`.
  pub fn parse(path: impl AsRef<Path>) -> Result<Self, DescriptorError> {
    let path = path.as_ref();
    let source = fs::read_to_string(path).map_err(|source| DescriptorError::Read {
      path: path.to_path_buf(),
      source,
    })?;
    Self::from_source(path, &source)
  }

  /// Parse Earthfile text as if it were read from `path`.
  pub fn from_source(path: impl AsRef<Path>, source: &str) -> Result<Self, DescriptorError> {
    let path = join_clean(Path::new("."), path.as_ref());
    let spec = parser::parse(source).map_err(|source| DescriptorError::Syntax {
      path: path.clone(),
      source,
    })?;
    let globals = parse_globals(&path, &spec.base_recipe)?;
    let dir = match path.parent() {
      Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
      _ => PathBuf::from("."),
    };

    debug!(path = %path.display(), targets = spec.targets.len(), "parsed Earthfile");

    Ok(Self {
      dir,
      path,
      spec,
      globals,
    })
  }

  pub fn target_names(&self) -> Vec<&str> {
    self.spec.targets.iter().map(|t| t.name.as_str()).collect()
  }

  /// Substitute `$NAME` and `${NAME}` references to global bindings.
  ///
  /// Substitution is a single left-to-right pass: a substituted value is never
  /// expanded again. When several names match at one position the longest
  /// wins, so `$TOPDIR` prefers a `TOPDIR` binding over `TOP`.
  pub fn expand_args(&self, s: &str) -> String {
    if !s.contains('$') || self.globals.is_empty() {
      return s.to_string();
    }

    let mut out = String::with_capacity(s.len());
    let mut rest = s;
    while let Some(idx) = rest.find('$') {
      out.push_str(&rest[..idx]);
      let after = &rest[idx + 1..];
      match self.match_global(after) {
        Some((consumed, value)) => {
          out.push_str(value);
          rest = &after[consumed..];
        }
        None => {
          out.push('$');
          rest = after;
        }
      }
    }
    out.push_str(rest);
    out
  }

  fn match_global(&self, s: &str) -> Option<(usize, &str)> {
    if let Some(inner) = s.strip_prefix('{')
      && let Some(end) = inner.find('}')
      && let Some(value) = self.globals.get(&inner[..end])
    {
      return Some((end + 2, value.as_str()));
    }

    self
      .globals
      .iter()
      .filter(|(name, _)| s.starts_with(name.as_str()))
      .max_by_key(|(name, _)| name.len())
      .map(|(name, value)| (name.len(), value.as_str()))
  }

  /// Look up a target declared in this Earthfile. A leading `+` is ignored.
  pub fn local_target(&self, name: &str) -> Result<&Target, DescriptorError> {
    let name = name.strip_prefix(TARGET_MARKER).unwrap_or(name);
    self
      .spec
      .targets
      .iter()
      .find(|t| t.name == name)
      .ok_or_else(|| DescriptorError::TargetNotFound {
        name: name.to_string(),
        path: self.path.clone(),
        available: self.target_names().join(", "),
      })
  }

  /// Resolve a target reference relative to this Earthfile.
  ///
  /// `path` is either a local name (`build`, `+build`) or `dir+name`, where
  /// `dir` is relative to this Earthfile's directory.
  pub fn target(self: &Arc<Self>, path: &str) -> Result<(Arc<Descriptor>, Target), DescriptorError> {
    if let Some((dir, name)) = path.split_once(TARGET_MARKER)
      && !dir.is_empty()
    {
      return rel_target(&join_clean(&self.dir, dir), name);
    }
    let target = self.local_target(path)?.clone();
    Ok((Arc::clone(self), target))
  }
}

/// Resolve a target path such as `services/api+build` relative to the current directory.
pub fn parse_target(path: &str) -> Result<(Arc<Descriptor>, Target), DescriptorError> {
  let Some((dir, name)) = path.split_once(TARGET_MARKER) else {
    return Err(DescriptorError::InvalidTargetPath(path.to_string()));
  };
  let dir = if dir.is_empty() { Path::new(".") } else { Path::new(dir) };
  rel_target(&join_clean(Path::new("."), dir), name)
}

/// Split an artifact reference into its target path and the path selected
/// within the target: `../lib+src/pkg/*` becomes `("../lib+src", Some("pkg/*"))`.
pub fn split_target_selector(path: &str) -> (&str, Option<&str>) {
  let Some(plus) = path.find(TARGET_MARKER) else {
    return (path, None);
  };
  match path[plus..].find('/') {
    Some(slash) => {
      let split = plus + slash;
      (&path[..split], Some(&path[split + 1..]))
    }
    None => (path, None),
  }
}

fn rel_target(dir: &Path, name: &str) -> Result<(Arc<Descriptor>, Target), DescriptorError> {
  let file = dir.join(DESCRIPTOR_FILE_NAME);
  fs::symlink_metadata(&file).map_err(|source| DescriptorError::DescriptorNotFound {
    path: file.clone(),
    source,
  })?;

  let descriptor = Arc::new(Descriptor::parse(&file)?);
  let target = descriptor.local_target(name)?.clone();
  Ok((descriptor, target))
}

fn parse_globals(path: &Path, base_recipe: &[Statement]) -> Result<BTreeMap<String, String>, DescriptorError> {
  let mut globals = BTreeMap::new();

  for stmt in base_recipe {
    let Statement::Command(command) = stmt else {
      continue;
    };
    if command.name != "ARG" {
      continue;
    }

    let args = match command.args.first().map(String::as_str) {
      Some("--global") => &command.args[1..],
      _ => &command.args[..],
    };
    if args.len() != 3 || args[1] != "=" || args[0].is_empty() {
      return Err(DescriptorError::ArgSyntax {
        path: path.to_path_buf(),
        args: command.args.clone(),
      });
    }
    globals.insert(args[0].clone(), args[2].clone());
  }

  Ok(globals)
}
