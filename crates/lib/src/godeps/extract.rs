//! Reading imports from Go source files.
//!
//! Only the file header is inspected: the `package` clause and the `import`
//! declarations that precede the first top-level declaration. Comments are
//! stripped first so commented-out imports are not reported.

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;
use tracing::trace;

use super::ImportError;

static PACKAGE_RE: LazyLock<Regex> =
  LazyLock::new(|| Regex::new(r"(?m)^\s*package\s+([A-Za-z_][A-Za-z0-9_]*)").expect("valid regex"));

static DECL_RE: LazyLock<Regex> =
  LazyLock::new(|| Regex::new(r"(?m)^\s*(?:func|type|var|const)\b").expect("valid regex"));

static IMPORT_BLOCK_RE: LazyLock<Regex> =
  LazyLock::new(|| Regex::new(r"(?s)\bimport\s*\((.*?)\)").expect("valid regex"));

static IMPORT_SINGLE_RE: LazyLock<Regex> =
  LazyLock::new(|| Regex::new(r#"\bimport\s+(?:[\w.]+\s+)?(?:"([^"]*)"|`([^`]*)`)"#).expect("valid regex"));

static IMPORT_SPEC_RE: LazyLock<Regex> =
  LazyLock::new(|| Regex::new(r#"(?:[\w.]+\s+)?(?:"([^"]*)"|`([^`]*)`)"#).expect("valid regex"));

/// Source of the imports of one package directory.
pub trait ImportExtractor {
  /// Imports of the package in `dir`, from either its test or its
  /// production files.
  fn package_imports(&self, dir: &Path, test: bool) -> Result<BTreeSet<String>, ImportError>;
}

/// [`ImportExtractor`] reading `.go` files directly inside a directory.
///
/// Production files are the `.go` files not ending in `_test.go`; test files
/// are the others. An external test package (`foo_test`) counts as `foo`.
#[derive(Debug, Clone, Copy, Default)]
pub struct GoImportExtractor;

impl ImportExtractor for GoImportExtractor {
  fn package_imports(&self, dir: &Path, test: bool) -> Result<BTreeSet<String>, ImportError> {
    let files = source_files(dir, test)?;

    let mut packages = BTreeSet::new();
    let mut imports = BTreeSet::new();
    for file in &files {
      let content = fs::read_to_string(file).map_err(|source| ImportError::Read {
        path: file.clone(),
        source,
      })?;
      let header = parse_header(&content);
      if let Some(package) = header.package {
        let package = package.strip_suffix("_test").unwrap_or(&package).to_string();
        packages.insert(package);
      }
      imports.extend(header.imports);
    }

    match packages.len() {
      0 => Err(ImportError::NoPackage(dir.to_path_buf())),
      1 => {
        trace!(dir = %dir.display(), test, imports = imports.len(), "read package imports");
        Ok(imports)
      }
      _ => Err(ImportError::MultiplePackages {
        dir: dir.to_path_buf(),
        names: packages.into_iter().collect(),
      }),
    }
  }
}

fn source_files(dir: &Path, test: bool) -> Result<Vec<PathBuf>, ImportError> {
  let entries = fs::read_dir(dir).map_err(|source| ImportError::ListDir {
    path: dir.to_path_buf(),
    source,
  })?;

  let mut files = Vec::new();
  for entry in entries {
    let entry = entry.map_err(|source| ImportError::ListDir {
      path: dir.to_path_buf(),
      source,
    })?;
    let name = entry.file_name();
    let name = name.to_string_lossy();
    if !name.ends_with(".go") || name.ends_with("_test.go") != test {
      continue;
    }
    if entry.file_type().is_ok_and(|t| !t.is_dir()) {
      files.push(entry.path());
    }
  }
  files.sort();
  Ok(files)
}

/// Package clause and imports of one Go source file.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct GoHeader {
  pub package: Option<String>,
  pub imports: Vec<String>,
}

/// Read the package clause and imports of Go source text.
pub fn parse_header(source: &str) -> GoHeader {
  let code = strip_comments(source);
  let header = match DECL_RE.find(&code) {
    Some(m) => &code[..m.start()],
    None => &code[..],
  };

  let package = PACKAGE_RE.captures(header).map(|c| c[1].to_string());

  let mut imports = Vec::new();
  for block in IMPORT_BLOCK_RE.captures_iter(header) {
    imports.extend(IMPORT_SPEC_RE.captures_iter(&block[1]).filter_map(quoted_path));
  }
  imports.extend(IMPORT_SINGLE_RE.captures_iter(header).filter_map(quoted_path));

  GoHeader { package, imports }
}

fn quoted_path(caps: regex::Captures<'_>) -> Option<String> {
  caps.get(1).or_else(|| caps.get(2)).map(|m| m.as_str().to_string())
}

/// Replace `//` and `/* */` comments with whitespace, leaving string and rune
/// literals untouched. Newlines inside block comments are kept.
fn strip_comments(source: &str) -> String {
  let mut out = String::with_capacity(source.len());
  let mut chars = source.chars().peekable();

  while let Some(c) = chars.next() {
    match c {
      '/' if chars.peek() == Some(&'/') => {
        for c in chars.by_ref() {
          if c == '\n' {
            out.push('\n');
            break;
          }
        }
      }
      '/' if chars.peek() == Some(&'*') => {
        chars.next();
        let mut prev = '\0';
        for c in chars.by_ref() {
          if c == '\n' {
            out.push('\n');
          }
          if prev == '*' && c == '/' {
            break;
          }
          prev = c;
        }
        out.push(' ');
      }
      '"' | '\'' => {
        out.push(c);
        while let Some(inner) = chars.next() {
          out.push(inner);
          if inner == '\\' {
            if let Some(escaped) = chars.next() {
              out.push(escaped);
            }
          } else if inner == c || inner == '\n' {
            break;
          }
        }
      }
      '`' => {
        out.push(c);
        for inner in chars.by_ref() {
          out.push(inner);
          if inner == '`' {
            break;
          }
        }
      }
      _ => out.push(c),
    }
  }
  out
}
