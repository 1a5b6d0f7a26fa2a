//! Go import resolution to `COPY` statements.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::ffi::OsStr;
use std::path::{Path, PathBuf};

use tracing::debug;
use walkdir::WalkDir;

use super::{GoImportExtractor, ImportError, ImportExtractor, module_path};
use crate::consts::{SELF_COPY_LINE, SKIPPED_PACKAGE_DIRS, TOP_ARG};
use crate::descriptor::format::format_command;
use crate::descriptor::locate::in_or_above;
use crate::descriptor::{Command, DescriptorError};
use crate::util::paths::{absolutize, join_clean, relative_to, replace_first, to_slash};

/// Import path to whether it was reached only through another internal package.
pub type PkgImports = BTreeMap<String, bool>;

type CacheKey = (PathBuf, bool);

/// Resolves the imports of packages in one Go module.
///
/// Transitive import sets are memoized per package directory and variant for
/// the lifetime of the resolver.
pub struct GoDepResolver<E = GoImportExtractor> {
  go_mod_root: PathBuf,
  proj_root: PathBuf,
  module_path: String,
  extractor: E,
  cache: HashMap<CacheKey, PkgImports>,
  in_progress: HashSet<CacheKey>,
  /// Packages re-entered through an import cycle while still in progress.
  cycle_heads: HashSet<CacheKey>,
}

impl GoDepResolver<GoImportExtractor> {
  /// Resolver for the module whose `go.mod` is in `go_mod_dir`.
  ///
  /// The project root is the top-most directory with an Earthfile in or
  /// above the module root.
  pub fn new(go_mod_dir: impl AsRef<Path>) -> Result<Self, ImportError> {
    Self::with_extractor(go_mod_dir, GoImportExtractor)
  }
}

impl<E: ImportExtractor> GoDepResolver<E> {
  pub fn with_extractor(go_mod_dir: impl AsRef<Path>, extractor: E) -> Result<Self, ImportError> {
    let go_mod_root = absolutize(go_mod_dir.as_ref()).map_err(ImportError::CurrentDir)?;
    let fs_root = go_mod_root.ancestors().last().unwrap_or(&go_mod_root).to_path_buf();
    let proj_root = in_or_above(&go_mod_root, &fs_root, false)?;
    let module_path = module_path(&go_mod_root)?;

    debug!(
      go_mod_root = %go_mod_root.display(),
      proj_root = %proj_root.display(),
      module = %module_path,
      "detected Go module"
    );

    Ok(Self {
      go_mod_root,
      proj_root,
      module_path,
      extractor,
      cache: HashMap::new(),
      in_progress: HashSet::new(),
      cycle_heads: HashSet::new(),
    })
  }

  pub fn module_path(&self) -> &str {
    &self.module_path
  }

  pub fn project_root(&self) -> &Path {
    &self.proj_root
  }

  /// Whether `import` names a package of this module.
  pub fn is_internal(&self, import: &str) -> bool {
    import
      .strip_prefix(&self.module_path)
      .is_some_and(|rest| rest.is_empty() || rest.starts_with('/'))
  }

  /// Directory of an internal import.
  fn import_dir(&self, import: &str) -> PathBuf {
    let rest = import.strip_prefix(&self.module_path).unwrap_or(import);
    join_clean(&self.go_mod_root, rest.trim_start_matches('/'))
  }

  /// Imports of the package in `dir`, all marked direct.
  pub fn collect_direct_imports(&self, dir: &Path, test: bool) -> Result<PkgImports, ImportError> {
    let imports = self.extractor.package_imports(dir, test)?;
    Ok(imports.into_iter().map(|i| (i, false)).collect())
  }

  /// Imports of the package in `dir` plus the production imports of every
  /// internal package it reaches.
  ///
  /// Imports reached through another package are marked transitive unless
  /// they were already recorded: the first discovery wins, and direct
  /// imports are always recorded first.
  pub fn collect_transitive_imports(&mut self, dir: &Path, test: bool) -> Result<PkgImports, ImportError> {
    let key = (join_clean(&self.go_mod_root, dir), test);
    if let Some(cached) = self.cache.get(&key) {
      return Ok(cached.clone());
    }
    if !self.in_progress.insert(key.clone()) {
      debug!(dir = %key.0.display(), "import cycle, not descending");
      self.cycle_heads.insert(key);
      return Ok(PkgImports::new());
    }

    let result = self.collect_transitive_uncached(&key.0, test);
    self.in_progress.remove(&key);
    self.cycle_heads.remove(&key);

    let imports = result?;
    // Below an open cycle head the set lacks the head's imports
    if self.cycle_heads.is_empty() {
      self.cache.insert(key, imports.clone());
    } else {
      debug!(dir = %key.0.display(), "partial imports inside a cycle, not caching");
    }
    Ok(imports)
  }

  fn collect_transitive_uncached(&mut self, dir: &Path, test: bool) -> Result<PkgImports, ImportError> {
    let mut imports = self.collect_direct_imports(dir, test)?;

    let internal: Vec<String> = imports.keys().filter(|i| self.is_internal(i)).cloned().collect();
    for dep in internal {
      debug!(import = %dep, from = %dir.display(), "resolving transitive internal import");
      let dep_dir = self.import_dir(&dep);
      for (import, _) in self.collect_transitive_imports(&dep_dir, false)? {
        imports.entry(import).or_insert(true);
      }
    }
    Ok(imports)
  }

  fn collect_imports(&mut self, dir: &Path, test: bool, transitive: bool) -> Result<PkgImports, ImportError> {
    if transitive {
      self.collect_transitive_imports(dir, test)
    } else {
      self.collect_direct_imports(dir, test)
    }
  }

  /// Production and test-only `COPY` statements for the packages in and
  /// below `pkg_root`.
  ///
  /// Directories without a Go package are skipped. Each list is sorted by
  /// statement text, deduplicated, and starts with the self copy when present.
  pub fn resolve_imports_to_copy_commands(
    &mut self,
    pkg_root: &Path,
    include_transitive: bool,
  ) -> Result<(Vec<Command>, Vec<Command>), ImportError> {
    let importer = absolutize(pkg_root).map_err(ImportError::CurrentDir)?;

    let mut imports = PkgImports::new();
    let mut test_imports = PkgImports::new();

    let walker = WalkDir::new(&importer)
      .into_iter()
      .filter_entry(|e| e.depth() == 0 || !(e.file_type().is_dir() && is_skipped_dir(e.file_name())));

    for entry in walker {
      let entry = entry.map_err(|source| ImportError::Walk {
        path: importer.clone(),
        source,
      })?;
      if !entry.file_type().is_dir() {
        continue;
      }

      let dir = entry.path();
      let prod = match self.collect_imports(dir, false, include_transitive) {
        Ok(prod) => prod,
        Err(e) => {
          // Directories that only hold other packages land here
          debug!(dir = %dir.display(), error = %e, "could not resolve package imports");
          continue;
        }
      };
      let test = self.collect_imports(dir, true, include_transitive).unwrap_or_else(|e| {
        debug!(dir = %dir.display(), error = %e, "no test imports");
        PkgImports::new()
      });

      for (import, transitive) in prod {
        imports.entry(import).or_insert(transitive);
      }
      for (import, transitive) in test {
        test_imports.entry(import).or_insert(transitive);
      }
    }

    test_imports.retain(|import, _| !imports.contains_key(import));

    let copies = self.copy_commands_for(&imports, &importer)?;
    let test_copies = self.copy_commands_for(&test_imports, &importer)?;
    Ok((copies, test_copies))
  }

  fn copy_commands_for(&self, imports: &PkgImports, importer: &Path) -> Result<Vec<Command>, ImportError> {
    let mut by_line: BTreeMap<String, Command> = BTreeMap::new();
    for (import, &transitive) in imports {
      if !self.is_internal(import) {
        continue;
      }
      let command = self.copy_command_for_import(importer, &self.import_dir(import), transitive)?;
      by_line.entry(format_command(&command.name, &command.args)).or_insert(command);
    }

    let self_copy = by_line.remove(SELF_COPY_LINE);
    Ok(self_copy.into_iter().chain(by_line.into_values()).collect())
  }

  fn copy_command_for_import(&self, importer: &Path, importee: &Path, transitive: bool) -> Result<Command, ImportError> {
    let earthdir = in_or_above(importee, &self.go_mod_root, true)?;

    if importer == importee || importer == importee.join("cmd") {
      return Ok(Command::new("COPY", ["--dir", "+src/*", "."]));
    }

    let src = format_copy_src(&self.proj_root, importee, &earthdir)?;
    let dest = format!(
      "{}/",
      replace_first(&to_slash(importee), &to_slash(&self.go_mod_root), TOP_ARG)
    );

    let mut args = vec!["--dir".to_string(), src, dest];
    if transitive {
      args.push("# indirect".to_string());
    }
    Ok(Command::new("COPY", args))
  }
}

fn is_skipped_dir(name: &OsStr) -> bool {
  SKIPPED_PACKAGE_DIRS.iter().any(|skipped| name == *skipped)
}

/// Source of the copy of `dir`, addressed through the `+src` target of the
/// Earthfile in `earthdir`, with the project root replaced by `$TOP`.
fn format_copy_src(proj_root: &Path, dir: &Path, earthdir: &Path) -> Result<String, ImportError> {
  let rel = relative_to(dir, earthdir).ok_or_else(|| DescriptorError::OutsideRoot {
    dir: dir.to_path_buf(),
    root: earthdir.to_path_buf(),
  })?;
  let src_dir = replace_first(&to_slash(earthdir), &to_slash(proj_root), TOP_ARG);

  if rel == Path::new(".") {
    Ok(format!("{src_dir}/+src/*"))
  } else {
    Ok(format!("{src_dir}/+src/{}/*", to_slash(&rel)))
  }
}

/// Render statements one per line.
pub fn format_copy_commands(commands: &[Command]) -> Vec<String> {
  commands.iter().map(|c| format_command(&c.name, &c.args)).collect()
}
