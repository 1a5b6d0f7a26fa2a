//! Change detection tests: `changed` and `matrix` against a real git history.
//!
//! Skipped when no `git` binary is available.

use predicates::prelude::*;

use super::common::{TestEnv, git_available};

/// A repository with a `base` tag, followed by a commit touching `api/`.
fn repo_with_api_change() -> TestEnv {
  let env = TestEnv::with_files(&[
    (
      "Earthfile",
      "VERSION 0.7\n\nall:\n    BUILD ./api+build\n    BUILD ./web+build\n",
    ),
    ("api/Earthfile", "VERSION 0.7\n\nbuild:\n    COPY main.go .\n"),
    ("api/main.go", "package main\n"),
    ("web/Earthfile", "VERSION 0.7\n\nbuild:\n    COPY index.html .\n"),
    ("web/index.html", "<html></html>\n"),
  ]);
  env.git_init_and_commit("initial");
  env.git(&["tag", "base"]);

  env.write("api/main.go", "package main\n\nfunc main() {}\n");
  env.commit_all("touch api");
  env
}

#[test]
fn changed_target_exits_zero() {
  if !git_available() {
    return;
  }
  let env = repo_with_api_change();

  env
    .stratus_cmd()
    .args(["changed", "./api+build", "--from-ref", "base"])
    .assert()
    .success()
    .stderr(predicate::str::contains("has changed inputs"));
}

#[test]
fn unchanged_target_exits_one() {
  if !git_available() {
    return;
  }
  let env = repo_with_api_change();

  env
    .stratus_cmd()
    .args(["changed", "./web+build", "--from-ref", "base"])
    .assert()
    .code(1)
    .stderr(predicate::str::contains("has no input changes"));
}

#[test]
fn base_ref_read_from_environment() {
  if !git_available() {
    return;
  }
  let env = repo_with_api_change();

  env
    .stratus_cmd()
    .env("GITHUB_BASE_REF", "base")
    .args(["changed", "./api+build"])
    .assert()
    .success();
}

#[test]
fn base_ref_falls_back_to_origin() {
  if !git_available() {
    return;
  }
  let env = repo_with_api_change();
  env.git(&["update-ref", "refs/remotes/origin/trunk", "base"]);

  env
    .stratus_cmd()
    .args(["changed", "./api+build", "--from-ref", "trunk"])
    .assert()
    .success();
}

#[test]
fn unknown_base_ref_exits_with_failure() {
  if !git_available() {
    return;
  }
  let env = repo_with_api_change();

  env
    .stratus_cmd()
    .args(["changed", "./api+build", "--from-ref", "no-such-branch"])
    .assert()
    .code(2)
    .stderr(predicate::str::contains("no-such-branch"));
}

#[test]
fn matrix_lists_changed_sub_builds() {
  if !git_available() {
    return;
  }
  let env = repo_with_api_change();

  env
    .stratus_cmd()
    .args(["matrix", "+all", "--from-ref", "base"])
    .assert()
    .success()
    .stdout("./api+build\n");
}

#[test]
fn matrix_without_changes_is_empty() {
  if !git_available() {
    return;
  }
  let env = repo_with_api_change();

  env
    .stratus_cmd()
    .args(["matrix", "+all", "--from-ref", "HEAD"])
    .assert()
    .success()
    .stdout("");
}

#[test]
fn matrix_json_appends_github_output() {
  if !git_available() {
    return;
  }
  let env = repo_with_api_change();
  let output = env.path("github_output");

  env
    .stratus_cmd()
    .env("GITHUB_OUTPUT", &output)
    .args(["matrix", "+all", "--json", "--from-ref", "base"])
    .assert()
    .success()
    .stdout("[\"./api+build\"]\n");

  let content = std::fs::read_to_string(&output).unwrap();
  assert_eq!(content, "targets=[\"./api+build\"]\n");
}

#[test]
fn deleted_input_counts_as_change() {
  if !git_available() {
    return;
  }
  let env = repo_with_api_change();
  env.git(&["tag", "before-delete"]);
  std::fs::remove_file(env.path("web/index.html")).unwrap();
  env.commit_all("drop index");

  env
    .stratus_cmd()
    .args(["matrix", "+all", "--from-ref", "before-delete"])
    .assert()
    .success()
    .stdout("./web+build\n");
}
