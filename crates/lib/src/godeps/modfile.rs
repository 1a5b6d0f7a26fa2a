//! `go.mod` reading.

use std::fs;
use std::path::Path;

use super::ImportError;

const GO_MOD_FILE_NAME: &str = "go.mod";

/// The module path declared by the `go.mod` in `dir`.
pub fn module_path(dir: &Path) -> Result<String, ImportError> {
  let path = dir.join(GO_MOD_FILE_NAME);
  let content = fs::read_to_string(&path).map_err(|source| ImportError::Read {
    path: path.clone(),
    source,
  })?;

  parse_module_directive(&content).ok_or(ImportError::NoModuleDirective(path))
}

fn parse_module_directive(content: &str) -> Option<String> {
  content.lines().find_map(|line| {
    let line = line.split("//").next().unwrap_or_default().trim();
    let rest = line.strip_prefix("module")?;
    // `module` must be a whole word
    if !rest.starts_with(char::is_whitespace) {
      return None;
    }
    let name = rest.trim().trim_matches(|c| c == '"' || c == '`');
    (!name.is_empty()).then(|| name.to_string())
  })
}
