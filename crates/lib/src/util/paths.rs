//! Lexical path helpers.
//!
//! Descriptor directories, copy sources and change-set entries are compared as
//! plain paths, so every join goes through [`normalize_path`] to drop `.` and
//! resolve `..` without touching the filesystem.

use std::io;
use std::path::{Component, Path, PathBuf};

/// Lexically normalize a path: remove `.` components and resolve `..` against
/// the preceding component where possible.
///
/// Leading `..` components of a relative path are kept, and `..` never climbs
/// above the root of an absolute path. An empty result becomes `.`.
pub fn normalize_path(path: &Path) -> PathBuf {
  let mut components: Vec<Component<'_>> = Vec::new();

  for component in path.components() {
    match component {
      Component::CurDir => {}
      Component::ParentDir => match components.last() {
        Some(Component::Normal(_)) => {
          components.pop();
        }
        Some(Component::RootDir) | Some(Component::Prefix(_)) => {}
        _ => components.push(component),
      },
      other => components.push(other),
    }
  }

  if components.is_empty() {
    return PathBuf::from(".");
  }
  components.iter().collect()
}

/// Join `rel` onto `base` and normalize the result.
pub fn join_clean(base: &Path, rel: impl AsRef<Path>) -> PathBuf {
  normalize_path(&base.join(rel))
}

/// Make a path absolute against the current directory, then normalize it.
pub fn absolutize(path: &Path) -> io::Result<PathBuf> {
  if path.is_absolute() {
    return Ok(normalize_path(path));
  }
  let cwd = std::env::current_dir()?;
  let cwd = dunce::canonicalize(&cwd).unwrap_or(cwd);
  Ok(join_clean(&cwd, path))
}

/// Resolve symlinks in the directories leading to `path`, keeping its file
/// name as is. Missing trailing directories are kept lexically below the
/// deepest one that exists, so deleted files resolve too.
pub fn canonicalize_parent(path: &Path) -> PathBuf {
  let (Some(parent), Some(name)) = (path.parent(), path.file_name()) else {
    return path.to_path_buf();
  };

  let mut existing = parent;
  let mut missing = Vec::new();
  loop {
    if let Ok(mut resolved) = dunce::canonicalize(existing) {
      resolved.extend(missing.iter().rev());
      resolved.push(name);
      return resolved;
    }
    match (existing.parent(), existing.file_name()) {
      (Some(up), Some(last)) => {
        missing.push(last);
        existing = up;
      }
      _ => return path.to_path_buf(),
    }
  }
}

/// Express `path` relative to `root`, or `None` when it lies outside of it.
pub fn relative_to(path: &Path, root: &Path) -> Option<PathBuf> {
  let rel = path.strip_prefix(root).ok()?;
  if rel.as_os_str().is_empty() {
    return Some(PathBuf::from("."));
  }
  Some(rel.to_path_buf())
}

/// Render a path with `/` separators, the form used by git.
pub fn to_slash(path: &Path) -> String {
  let mut out = String::new();
  for component in path.components() {
    match component {
      Component::RootDir => out.push('/'),
      other => {
        if !out.is_empty() && !out.ends_with('/') {
          out.push('/');
        }
        out.push_str(&other.as_os_str().to_string_lossy());
      }
    }
  }
  out
}

/// Replace the first occurrence of `from` in `s` with `to`.
pub fn replace_first(s: &str, from: &str, to: &str) -> String {
  s.replacen(from, to, 1)
}
