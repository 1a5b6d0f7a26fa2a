//! Test utilities for stratus-lib.
//!
//! Helpers for laying out throwaway project trees (Earthfiles, sources, Go
//! packages) inside a temporary directory.

use std::fs;
use std::path::{Path, PathBuf};

use tempfile::TempDir;

/// Write `files` (relative path, content) below `root`, creating parent directories.
pub fn write_tree(root: &Path, files: &[(&str, &str)]) {
  for (rel, content) in files {
    let path = root.join(rel);
    if let Some(parent) = path.parent() {
      fs::create_dir_all(parent).unwrap();
    }
    fs::write(&path, content).unwrap();
  }
}

/// Create a temporary directory populated with `files`.
///
/// The returned path is canonicalized so it compares equal to paths produced
/// by the resolver on platforms where the temp dir is behind a symlink.
pub fn temp_tree(files: &[(&str, &str)]) -> (TempDir, PathBuf) {
  let temp = TempDir::new().unwrap();
  let root = dunce::canonicalize(temp.path()).unwrap();
  write_tree(&root, files);
  (temp, root)
}
