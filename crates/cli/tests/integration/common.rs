//! Shared test helpers for CLI integration tests.

use std::path::{Path, PathBuf};
use std::process::Command as StdCommand;

use assert_cmd::Command;
use assert_cmd::cargo::cargo_bin_cmd;
use tempfile::TempDir;

/// Isolated test environment.
///
/// Each test gets its own temporary project directory; commands run with it
/// as their working directory.
pub struct TestEnv {
  pub temp: TempDir,
  pub root: PathBuf,
}

impl TestEnv {
  pub fn empty() -> Self {
    let temp = TempDir::new().unwrap();
    let root = dunce::canonicalize(temp.path()).unwrap();
    Self { temp, root }
  }

  /// Create a project from `(relative path, content)` pairs.
  pub fn with_files(files: &[(&str, &str)]) -> Self {
    let env = Self::empty();
    for (path, content) in files {
      env.write(path, content);
    }
    env
  }

  pub fn write(&self, rel: &str, content: &str) {
    let path = self.root.join(rel);
    if let Some(parent) = path.parent() {
      std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(path, content).unwrap();
  }

  pub fn path(&self, rel: &str) -> PathBuf {
    self.root.join(rel)
  }

  /// A stratus command running in the project root, isolated from CI environment.
  pub fn stratus_cmd(&self) -> Command {
    let mut cmd = cargo_bin_cmd!("stratus");
    cmd
      .current_dir(&self.root)
      .env("STRATUS_NO_PROGRESS", "1")
      .env_remove("GITHUB_BASE_REF")
      .env_remove("GITHUB_SHA")
      .env_remove("GITHUB_OUTPUT")
      .env_remove("RUST_LOG");
    cmd
  }

  /// Run git in the project root with a fixed identity.
  pub fn git(&self, args: &[&str]) {
    run_git(&self.root, args);
  }

  /// Initialize a repository and commit every file.
  pub fn git_init_and_commit(&self, message: &str) {
    self.git(&["init", "-q"]);
    self.commit_all(message);
  }

  pub fn commit_all(&self, message: &str) {
    self.git(&["add", "-A"]);
    self.git(&["commit", "-q", "-m", message]);
  }
}

pub fn git_available() -> bool {
  StdCommand::new("git")
    .arg("--version")
    .output()
    .is_ok_and(|o| o.status.success())
}

fn run_git(dir: &Path, args: &[&str]) {
  let output = StdCommand::new("git")
    .args([
      "-c",
      "user.name=stratus",
      "-c",
      "user.email=stratus@example.com",
      "-c",
      "commit.gpgsign=false",
      "-c",
      "init.defaultBranch=main",
    ])
    .args(args)
    .current_dir(dir)
    .output()
    .unwrap();
  assert!(
    output.status.success(),
    "git {:?} failed: {}",
    args,
    String::from_utf8_lossy(&output.stderr)
  );
}
