//! Finding the Earthfile that owns a directory.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::trace;

use super::DescriptorError;
use crate::consts::DESCRIPTOR_FILE_NAME;

/// Look for an Earthfile in `dir` and each of its parents, up to and including `up_to`.
///
/// With `closest`, the first directory found walking upwards is returned;
/// otherwise the top-most one.
pub fn in_or_above(dir: &Path, up_to: &Path, closest: bool) -> Result<PathBuf, DescriptorError> {
  if !dir.starts_with(up_to) {
    return Err(DescriptorError::OutsideRoot {
      dir: dir.to_path_buf(),
      root: up_to.to_path_buf(),
    });
  }

  let mut found: Option<PathBuf> = None;
  let mut current = Some(dir);

  while let Some(d) = current {
    if has_descriptor(d)? {
      trace!(dir = %d.display(), "found Earthfile");
      if closest {
        return Ok(d.to_path_buf());
      }
      found = Some(d.to_path_buf());
    }
    if d == up_to {
      break;
    }
    current = d.parent();
  }

  found.ok_or_else(|| DescriptorError::NoDescriptorAbove(dir.to_path_buf()))
}

fn has_descriptor(dir: &Path) -> Result<bool, DescriptorError> {
  let path = dir.join(DESCRIPTOR_FILE_NAME);
  match fs::metadata(&path) {
    Ok(meta) => Ok(meta.is_file()),
    Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
    Err(source) => Err(DescriptorError::Read { path, source }),
  }
}
