//! Input resolution tests: `inspect` and `dependents`.

use predicates::prelude::*;

use super::common::TestEnv;

const ROOT_EARTHFILE: &str = "\
VERSION 0.7

all:
    BUILD ./api+build
    BUILD ./web+build
";

const API_EARTHFILE: &str = "\
VERSION 0.7

build:
    FROM ../lib+src
    COPY main.go .
";

const WEB_EARTHFILE: &str = "\
VERSION 0.7

build:
    COPY --dir static ./
";

const LIB_EARTHFILE: &str = "\
VERSION 0.7

src:
    COPY *.go .
";

fn monorepo() -> TestEnv {
  TestEnv::with_files(&[
    ("Earthfile", ROOT_EARTHFILE),
    ("api/Earthfile", API_EARTHFILE),
    ("api/main.go", "package main\n"),
    ("web/Earthfile", WEB_EARTHFILE),
    ("web/static/index.html", "<html></html>\n"),
    ("web/static/css/site.css", "body {}\n"),
    ("lib/Earthfile", LIB_EARTHFILE),
    ("lib/lib.go", "package lib\n"),
    ("lib/README.md", "# lib\n"),
  ])
}

#[test]
fn inspect_lists_sorted_inputs() {
  let env = monorepo();

  env
    .stratus_cmd()
    .args(["inspect", "api+build"])
    .assert()
    .success()
    .stdout("api/main.go\nlib/Earthfile\nlib/lib.go\n");
}

#[test]
fn inspect_expands_directories() {
  let env = monorepo();

  env
    .stratus_cmd()
    .args(["inputs", "./web+build"])
    .assert()
    .success()
    .stdout("web/static/css/site.css\nweb/static/index.html\n");
}

#[test]
fn inspect_pretty_prints_tree() {
  let env = monorepo();

  env
    .stratus_cmd()
    .args(["inspect", "--pretty", "web+build"])
    .assert()
    .success()
    .stdout("└── web/\n    └── static/\n        ├── css/\n        │   └── site.css\n        └── index.html\n");
}

#[test]
fn inspect_with_chdir() {
  let env = monorepo();

  env
    .stratus_cmd()
    .current_dir(env.temp.path().parent().unwrap())
    .arg("--chdir")
    .arg(env.path("api"))
    .args(["inspect", "+build"])
    .assert()
    .success()
    .stdout("../lib/Earthfile\n../lib/lib.go\nmain.go\n");
}

#[test]
fn dependents_lists_readers_of_paths() {
  let env = monorepo();

  env
    .stratus_cmd()
    .args(["dependents", "+all", "lib/lib.go"])
    .assert()
    .success()
    .stdout("./api+build\n");
}

#[test]
fn dependents_of_unrelated_file_is_empty() {
  let env = monorepo();

  env
    .stratus_cmd()
    .args(["dependents", "+all", "lib/README.md"])
    .assert()
    .success()
    .stdout("");
}

#[test]
fn dependents_fails_fast_on_broken_sub_build() {
  let env = monorepo();
  env.write("Earthfile", &format!("{}    BUILD ./missing+build\n", ROOT_EARTHFILE));

  env
    .stratus_cmd()
    .args(["dependents", "+all", "web/static/index.html"])
    .assert()
    .code(2)
    .stderr(predicate::str::contains("./missing+build"));
}

#[test]
fn dependents_continue_on_error_reports_failures() {
  let env = monorepo();
  env.write("Earthfile", &format!("{}    BUILD ./missing+build\n", ROOT_EARTHFILE));

  env
    .stratus_cmd()
    .args(["dependents", "--continue-on-error", "+all", "web/static/index.html"])
    .assert()
    .success()
    .stdout("./web+build\n")
    .stderr(predicate::str::contains("Failed to evaluate './missing+build'"));
}
