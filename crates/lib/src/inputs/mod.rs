//! Input-set expansion.
//!
//! A target's inputs are the files reached by its `COPY` statements. Each
//! collected [`CopyCmd`] expands, in priority order, as:
//!
//! 1. a target reference (`+src`, `../lib+src/pkg/*`): the union of that
//!    target's own inputs
//! 2. a glob pattern: every matching file, with matched directories walked
//! 3. an existing directory: every file beneath it
//! 4. anything else: the single path, joined onto the statement's directory
//!
//! The sentinel entry recorded for a followed `FROM +target` expands to the
//! referenced Earthfile itself.

mod types;

use std::fs;
use std::path::Path;
use std::sync::Arc;

use tracing::{debug, trace};
use walkdir::WalkDir;

pub use types::*;

use crate::collect::{CopyCmd, collect_copy_commands_in};
use crate::consts::TARGET_MARKER;
use crate::descriptor::{Descriptor, Target, parse_target, split_target_selector};
use crate::util::paths::join_clean;

/// Resolve a target path such as `services/api+build` and expand its inputs.
pub fn analyze_target_deps(target_path: &str) -> Result<InputSet, ResolveError> {
  let (descriptor, target) = parse_target(target_path)?;
  target_inputs(&descriptor, &target)
}

/// Expand every `COPY` statement reachable from `target` into the files it reads.
pub fn target_inputs(descriptor: &Arc<Descriptor>, target: &Target) -> Result<InputSet, ResolveError> {
  let mut stack = ResolveStack::new();
  inputs_within(descriptor, target, &mut stack)
}

/// Expand a single collected copy command.
pub fn expand_copy_cmd(copy: &CopyCmd) -> Result<InputSet, ResolveError> {
  let mut stack = ResolveStack::new();
  expand_within(copy, &mut stack)
}

fn inputs_within(
  descriptor: &Arc<Descriptor>,
  target: &Target,
  stack: &mut ResolveStack,
) -> Result<InputSet, ResolveError> {
  stack.enter(descriptor, &target.name)?;
  let result = collect_and_expand(descriptor, target, stack);
  stack.leave();

  if let Ok(inputs) = &result {
    debug!(
      dir = %descriptor.dir.display(),
      target = %target.name,
      inputs = inputs.len(),
      "expanded target inputs"
    );
  }
  result
}

fn collect_and_expand(
  descriptor: &Arc<Descriptor>,
  target: &Target,
  stack: &mut ResolveStack,
) -> Result<InputSet, ResolveError> {
  let mut inputs = InputSet::new();
  for copy in collect_copy_commands_in(descriptor, target, stack)? {
    inputs.extend(expand_within(&copy, stack)?);
  }
  Ok(inputs)
}

fn expand_within(copy: &CopyCmd, stack: &mut ResolveStack) -> Result<InputSet, ResolveError> {
  if copy.is_sentinel() {
    return Ok(InputSet::from([copy.from.clone().into()]));
  }

  let descriptor = &copy.descriptor;
  let from = descriptor.expand_args(&copy.from);
  let to = descriptor.expand_args(&copy.to);
  trace!(dir = %descriptor.dir.display(), from = %from, to = %to, "expanding COPY");

  if from.contains(TARGET_MARKER) {
    return expand_target_ref(descriptor, &from, stack);
  }

  let path = join_clean(&descriptor.dir, &from);
  if from.contains('*') {
    return expand_glob(&descriptor.dir, &path);
  }

  match fs::metadata(&path) {
    Ok(meta) if meta.is_dir() => list_files(&path),
    _ => Ok(InputSet::from([path])),
  }
}

fn expand_target_ref(
  descriptor: &Arc<Descriptor>,
  from: &str,
  stack: &mut ResolveStack,
) -> Result<InputSet, ResolveError> {
  let (target_path, selector) = split_target_selector(from);
  if let Some(selector) = selector {
    // Artifact selectors are not tracked: the whole target counts
    trace!(target = %target_path, selector = %selector, "ignoring artifact selector");
  }

  let (ref_descriptor, ref_target) = descriptor.target(target_path).map_err(|source| ResolveError::Target {
    target: target_path.to_string(),
    dir: descriptor.dir.clone(),
    source: Box::new(source.into()),
  })?;

  inputs_within(&ref_descriptor, &ref_target, stack)
}

fn expand_glob(dir: &Path, pattern: &Path) -> Result<InputSet, ResolveError> {
  let pattern = pattern.to_string_lossy();
  let matches = glob::glob(&pattern).map_err(|source| ResolveError::Glob {
    pattern: pattern.to_string(),
    dir: dir.to_path_buf(),
    source,
  })?;

  let mut inputs = InputSet::new();
  for entry in matches {
    let path = entry.map_err(|source| ResolveError::GlobEntry {
      dir: dir.to_path_buf(),
      source,
    })?;
    if path.is_dir() {
      inputs.extend(list_files(&path)?);
    } else {
      inputs.insert(path);
    }
  }
  Ok(inputs)
}

/// Every non-directory entry beneath `dir`.
fn list_files(dir: &Path) -> Result<InputSet, ResolveError> {
  let mut files = InputSet::new();
  for entry in WalkDir::new(dir) {
    let entry = entry.map_err(|source| ResolveError::Walk {
      path: dir.to_path_buf(),
      source,
    })?;
    if !entry.file_type().is_dir() {
      files.insert(entry.into_path());
    }
  }
  Ok(files)
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::collect::collect_copy_commands;
  use crate::util::testutil::temp_tree;

  fn inputs_of(target_path: &str) -> InputSet {
    analyze_target_deps(target_path).unwrap()
  }

  fn set(root: &Path, paths: &[&str]) -> InputSet {
    paths.iter().map(|p| root.join(p)).collect()
  }

  #[test]
  fn literal_paths_join_onto_descriptor_dir() {
    let (_temp, root) = temp_tree(&[(
      "app/Earthfile",
      "VERSION 0.7\nbuild:\n    COPY ./main.go missing.txt .\n",
    )]);

    let inputs = inputs_of(&format!("{}/app+build", root.display()));
    assert_eq!(inputs, set(&root, &["app/main.go", "app/missing.txt"]));
  }

  #[test]
  fn directories_expand_to_their_files() {
    let (_temp, root) = temp_tree(&[
      ("Earthfile", "VERSION 0.7\nbuild:\n    COPY --dir src ./src\n"),
      ("src/a.txt", "a"),
      ("src/sub/b.txt", "b"),
    ]);

    let inputs = inputs_of(&format!("{}+build", root.display()));
    assert_eq!(inputs, set(&root, &["src/a.txt", "src/sub/b.txt"]));
  }

  #[test]
  fn glob_directory_matches_are_walked() {
    let (_temp, root) = temp_tree(&[
      ("Earthfile", "VERSION 0.7\nbuild:\n    COPY sr* ./\n"),
      ("src/a.txt", "a"),
      ("src/sub/b.txt", "b"),
      ("other.txt", "o"),
    ]);

    let inputs = inputs_of(&format!("{}+build", root.display()));
    assert_eq!(inputs, set(&root, &["src/a.txt", "src/sub/b.txt"]));
  }

  #[test]
  fn glob_file_matches_are_leaves() {
    let (_temp, root) = temp_tree(&[
      ("Earthfile", "VERSION 0.7\nbuild:\n    COPY *.go .\n"),
      ("a.go", ""),
      ("b.go", ""),
      ("README.md", ""),
    ]);

    let inputs = inputs_of(&format!("{}+build", root.display()));
    assert_eq!(inputs, set(&root, &["a.go", "b.go"]));
  }

  #[test]
  fn overlapping_entries_are_deduplicated() {
    let (_temp, root) = temp_tree(&[
      (
        "Earthfile",
        "VERSION 0.7\nbuild:\n    COPY src .\n    COPY src/* .\n    COPY src/a.txt .\n",
      ),
      ("src/a.txt", "a"),
      ("src/b.txt", "b"),
    ]);

    let inputs = inputs_of(&format!("{}+build", root.display()));
    assert_eq!(inputs, set(&root, &["src/a.txt", "src/b.txt"]));
  }

  #[test]
  fn target_references_are_transitive() {
    let (_temp, root) = temp_tree(&[
      (
        "Earthfile",
        "VERSION 0.7\na:\n    COPY +b/out .\nb:\n    COPY x .\n",
      ),
      ("x", "x"),
    ]);

    let inputs = inputs_of(&format!("{}+a", root.display()));
    assert!(inputs.contains(&root.join("x")));
  }

  #[test]
  fn cross_descriptor_references_use_globals() {
    let (_temp, root) = temp_tree(&[
      (
        "app/Earthfile",
        "VERSION 0.7\nARG TOP=..\nbuild:\n    COPY $TOP/lib+src/pkg .\n    COPY config.yaml .\n",
      ),
      ("app/config.yaml", ""),
      ("lib/Earthfile", "VERSION 0.7\nsrc:\n    COPY lib.go .\n"),
      ("lib/lib.go", ""),
    ]);

    let inputs = inputs_of(&format!("{}/app+build", root.display()));
    assert_eq!(inputs, set(&root, &["app/config.yaml", "lib/lib.go"]));
  }

  #[test]
  fn from_targets_contribute_their_earthfile() {
    let (_temp, root) = temp_tree(&[
      ("app/Earthfile", "VERSION 0.7\nbuild:\n    FROM ../base+deps\n    COPY main.go .\n"),
      ("base/Earthfile", "VERSION 0.7\ndeps:\n    COPY go.mod .\n"),
    ]);

    let inputs = inputs_of(&format!("{}/app+build", root.display()));
    assert_eq!(
      inputs,
      set(&root, &["app/main.go", "base/Earthfile", "base/go.mod"])
    );
  }

  #[test]
  fn expanding_a_sentinel_yields_the_referenced_file() {
    let (_temp, root) = temp_tree(&[
      ("Earthfile", "VERSION 0.7\na:\n    FROM +b\nb:\n    RUN true\n"),
    ]);
    let (d, t) = parse_target(&format!("{}+a", root.display())).unwrap();
    let cmds = collect_copy_commands(&d, &t).unwrap();
    assert_eq!(cmds.len(), 1);

    let inputs = expand_copy_cmd(&cmds[0]).unwrap();
    assert_eq!(inputs, InputSet::from([root.join("Earthfile")]));
  }

  #[test]
  fn copy_cycles_are_reported() {
    let (_temp, root) = temp_tree(&[(
      "Earthfile",
      "VERSION 0.7\na:\n    COPY +b/x .\nb:\n    COPY +a/y .\n",
    )]);

    let err = analyze_target_deps(&format!("{}+a", root.display())).unwrap_err();
    let ResolveError::CyclicReference { chain } = err else {
      panic!("expected a cycle, got {err}");
    };
    assert!(chain.ends_with("+a"));
    assert_eq!(chain.matches(" -> ").count(), 2);
  }

  #[test]
  fn self_reference_is_a_cycle() {
    let (_temp, root) = temp_tree(&[("Earthfile", "VERSION 0.7\na:\n    COPY +a/out .\n")]);
    let err = analyze_target_deps(&format!("{}+a", root.display())).unwrap_err();
    assert!(matches!(err, ResolveError::CyclicReference { .. }));
  }

  #[test]
  fn shared_dependencies_are_not_cycles() {
    let (_temp, root) = temp_tree(&[
      (
        "Earthfile",
        "VERSION 0.7\na:\n    COPY +b/x .\n    COPY +c/x .\nb:\n    COPY +d/x .\nc:\n    COPY +d/x .\nd:\n    COPY d.txt .\n",
      ),
      ("d.txt", ""),
    ]);

    let inputs = inputs_of(&format!("{}+a", root.display()));
    assert_eq!(inputs, set(&root, &["d.txt"]));
  }

  #[test]
  fn unknown_target_reference_names_the_reference() {
    let (_temp, root) = temp_tree(&[("Earthfile", "VERSION 0.7\na:\n    COPY +nope/x .\n")]);
    let err = analyze_target_deps(&format!("{}+a", root.display())).unwrap_err();
    let message = err.to_string();
    assert!(message.contains("'+nope'"), "{message}");
    assert!(message.contains("available targets: a"), "{message}");
  }

  #[test]
  fn invalid_glob_is_an_error() {
    let (_temp, root) = temp_tree(&[("Earthfile", "VERSION 0.7\na:\n    COPY [*.go .\n")]);
    let err = analyze_target_deps(&format!("{}+a", root.display())).unwrap_err();
    assert!(matches!(err, ResolveError::Glob { .. }));
  }
}
