//! Go import analysis.
//!
//! Maps the module-internal imports of a Go package onto the `COPY`
//! statements its Earthfile should declare. Every imported directory is
//! assumed to be covered by a `+src` target of the closest Earthfile in or
//! above it; whether that target exists is not checked.
//!
//! - [`extract`] reads package names and imports from `.go` files
//! - [`modfile`] reads the module path from `go.mod`
//! - [`resolver`] walks packages and produces the statements

pub mod extract;
pub mod modfile;
pub mod resolver;

use std::io;
use std::path::PathBuf;

use thiserror::Error;

pub use extract::{GoImportExtractor, ImportExtractor};
pub use modfile::module_path;
pub use resolver::{GoDepResolver, PkgImports, format_copy_commands};

use crate::descriptor::DescriptorError;

/// Errors that can occur while resolving Go imports.
#[derive(Debug, Error)]
pub enum ImportError {
  /// A directory could not be listed.
  #[error("could not list '{path}': {source}")]
  ListDir {
    path: PathBuf,
    #[source]
    source: io::Error,
  },

  /// A source file or `go.mod` could not be read.
  #[error("could not read '{path}': {source}")]
  Read {
    path: PathBuf,
    #[source]
    source: io::Error,
  },

  /// The directory holds no Go files of the requested kind.
  #[error("no source-code package in directory '{0}'")]
  NoPackage(PathBuf),

  /// The directory's files declare different packages.
  #[error("multiple packages in directory '{dir}': {}", names.join(", "))]
  MultiplePackages { dir: PathBuf, names: Vec<String> },

  /// `go.mod` has no `module` directive.
  #[error("no module directive in '{0}'")]
  NoModuleDirective(PathBuf),

  /// Walking the package tree failed.
  #[error("could not walk '{path}': {source}")]
  Walk {
    path: PathBuf,
    #[source]
    source: walkdir::Error,
  },

  /// Locating the Earthfile of an imported directory failed.
  #[error(transparent)]
  Descriptor(#[from] DescriptorError),

  /// Relative paths could not be anchored.
  #[error("could not determine the current directory: {0}")]
  CurrentDir(#[source] io::Error),
}
