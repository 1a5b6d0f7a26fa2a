//! Go import to `COPY` statement generation through the `gocopies` command.

use predicates::prelude::*;

use super::common::TestEnv;

const GO_MOD: &str = "module example.com/mono\n\ngo 1.21\n";

fn go_project() -> TestEnv {
  TestEnv::with_files(&[
    ("Earthfile", "VERSION 0.7\n"),
    ("go/go.mod", GO_MOD),
    ("go/svc/Earthfile", "VERSION 0.7\n"),
    (
      "go/svc/main.go",
      "package main\n\nimport (\n\t\"fmt\"\n\n\t\"example.com/mono/lib/log\"\n)\n\nfunc main() { fmt.Println(log.Name) }\n",
    ),
    (
      "go/svc/main_test.go",
      "package main\n\nimport (\n\t\"testing\"\n\n\t\"example.com/mono/lib/testutil\"\n)\n",
    ),
    ("go/lib/Earthfile", "VERSION 0.7\n"),
    ("go/lib/log/log.go", "package log\n\nimport \"example.com/mono/lib/fmtx\"\n"),
    ("go/lib/fmtx/fmtx.go", "package fmtx\n"),
    ("go/lib/testutil/testutil.go", "package testutil\n"),
  ])
}

#[test]
fn prints_direct_and_test_imports() {
  let env = go_project();

  let expected = "
# Go imports (generated with `stratus gocopies go/svc`)
COPY --dir $TOP/go/lib/+src/log/* $TOP/lib/log/

# Go test imports (generated with `stratus gocopies go/svc`)
COPY --dir $TOP/go/lib/+src/testutil/* $TOP/lib/testutil/

";

  env
    .stratus_cmd()
    .args(["gocopies", "go/svc", "--go-mod-dir", "go"])
    .assert()
    .success()
    .stdout(expected);
}

#[test]
fn include_transitive_marks_indirect_imports() {
  let env = go_project();

  env
    .stratus_cmd()
    .args(["gocopies", "--include-transitive", "go/svc", "--go-mod-dir", "go"])
    .assert()
    .success()
    .stdout(
      predicate::str::contains("generated with `stratus gocopies --include-transitive go/svc`")
        .and(predicate::str::contains("COPY --dir $TOP/go/lib/+src/fmtx/* $TOP/lib/fmtx/ # indirect"))
        .and(predicate::str::contains("COPY --dir $TOP/go/lib/+src/log/* $TOP/lib/log/\n")),
    );
}

#[test]
fn go_mod_dir_defaults_to_current_directory() {
  let env = go_project();

  env
    .stratus_cmd()
    .current_dir(env.path("go"))
    .args(["gocopies", "svc"])
    .assert()
    .success()
    .stdout(predicate::str::contains("COPY --dir $TOP/go/lib/+src/log/* $TOP/lib/log/"));
}

#[test]
fn missing_go_mod_exits_with_failure() {
  let env = go_project();

  env
    .stratus_cmd()
    .args(["gocopies", "go/svc"])
    .assert()
    .code(2)
    .stderr(predicate::str::contains("Failed to load Go module"));
}
