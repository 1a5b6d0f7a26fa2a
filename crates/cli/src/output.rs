//! CLI output formatting utilities.
//!
//! Status lines go to stderr so stdout carries only the command's result
//! (target lists, JSON, generated COPY statements) and stays pipeable.

use std::collections::BTreeMap;
use std::error::Error;
use std::fs::OpenOptions;
use std::io::{IsTerminal, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use indicatif::{ProgressBar, ProgressStyle};
use owo_colors::{OwoColorize, Stream};

use stratus_lib::impact::SubBuildFailure;

/// Set to any value to disable the progress spinner.
pub const NO_PROGRESS_ENV: &str = "STRATUS_NO_PROGRESS";

pub mod symbols {
  pub const SUCCESS: &str = "✓";
  pub const ERROR: &str = "✗";
  pub const WARNING: &str = "⚠";
  pub const INFO: &str = "•";
}

pub fn print_status(message: &str) {
  eprintln!(
    "{} {}",
    symbols::SUCCESS.if_supports_color(Stream::Stderr, |s| s.green()),
    message
  );
}

pub fn print_info(message: &str) {
  eprintln!(
    "{} {}",
    symbols::INFO.if_supports_color(Stream::Stderr, |s| s.blue()),
    message
  );
}

pub fn print_error(message: &str) {
  eprintln!(
    "{} {}",
    symbols::ERROR.if_supports_color(Stream::Stderr, |s| s.red()),
    message.if_supports_color(Stream::Stderr, |s| s.red())
  );
}

pub fn print_warning(message: &str) {
  eprintln!(
    "{} {}",
    symbols::WARNING.if_supports_color(Stream::Stderr, |s| s.yellow()),
    message.if_supports_color(Stream::Stderr, |s| s.yellow())
  );
}

/// Warn about every sub-build a batch could not evaluate.
pub fn print_failures(failures: &[SubBuildFailure]) {
  if failures.is_empty() {
    return;
  }
  for failure in failures {
    print_warning(&format!(
      "Failed to evaluate '{}': {}",
      failure.target,
      error_chain(&failure.error)
    ));
  }
  print_info(&format!("{} sub-build(s) skipped", failures.len()));
}

/// Join an error and its sources with `: `, like anyhow's `{:#}`.
fn error_chain(err: &dyn Error) -> String {
  let mut out = err.to_string();
  let mut source = err.source();
  while let Some(cause) = source {
    out.push_str(": ");
    out.push_str(&cause.to_string());
    source = cause.source();
  }
  out
}

/// A spinner on stderr, hidden when stderr is not a terminal or
/// `STRATUS_NO_PROGRESS` is set.
pub fn spinner(message: &str) -> ProgressBar {
  if std::env::var_os(NO_PROGRESS_ENV).is_some() || !std::io::stderr().is_terminal() {
    return ProgressBar::hidden();
  }

  let bar = ProgressBar::new_spinner();
  bar.set_style(ProgressStyle::with_template("  {spinner} {msg}").expect("valid template"));
  bar.set_message(message.to_string());
  bar.enable_steady_tick(Duration::from_millis(100));
  bar
}

/// Append `key=value` to a GitHub Actions output file.
pub fn append_github_output(path: &Path, key: &str, value: &str) -> anyhow::Result<()> {
  let mut file = OpenOptions::new()
    .create(true)
    .append(true)
    .open(path)
    .with_context(|| format!("Failed to open GitHub output file '{}'", path.display()))?;
  writeln!(file, "{}={}", key, value)
    .with_context(|| format!("Failed to write GitHub output file '{}'", path.display()))?;
  Ok(())
}

#[derive(Default)]
struct TreeNode {
  children: BTreeMap<String, TreeNode>,
}

/// Render paths as an ASCII tree, one node per path component.
pub fn render_tree<'a>(paths: impl IntoIterator<Item = &'a PathBuf>) -> String {
  let mut root = TreeNode::default();
  for path in paths {
    let mut node = &mut root;
    for component in path.components() {
      let name = component.as_os_str().to_string_lossy().into_owned();
      node = node.children.entry(name).or_default();
    }
  }

  let mut out = String::new();
  render_children(&root, "", &mut out);
  out
}

fn render_children(node: &TreeNode, prefix: &str, out: &mut String) {
  let count = node.children.len();
  for (i, (name, child)) in node.children.iter().enumerate() {
    let last = i + 1 == count;
    let branch = if last { "└── " } else { "├── " };
    let suffix = if child.children.is_empty() || name.ends_with('/') { "" } else { "/" };
    out.push_str(&format!("{}{}{}{}\n", prefix, branch, name, suffix));

    let nested = format!("{}{}", prefix, if last { "    " } else { "│   " });
    render_children(child, &nested, out);
  }
}
