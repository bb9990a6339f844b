use predicates::prelude::*;

use crate::common::TestProject;

#[test]
fn test_verify_integrated_fork() {
    let project = TestProject::integrated_fork("0.80.2").unwrap();
    project
        .cmd()
        .arg("verify")
        .assert()
        .success()
        .stdout(predicate::str::contains("All 8 checks passed"));

    project
        .cmd()
        .args(["verify", "--expect-version", "0.80.2"])
        .assert()
        .success();
}

#[test]
fn test_verify_reports_every_failure() {
    let project = TestProject::integrated_fork("0.80.2").unwrap();
    std::fs::remove_file(project.fork_path().join("MANIFEST.in")).unwrap();

    project
        .cmd()
        .args(["verify", "--repo-dir"])
        .arg(project.fork_path())
        .args(["--expect-version", "0.81.0"])
        .assert()
        .code(1)
        .stdout(predicate::str::contains("[FAIL] MANIFEST.in: exists"))
        .stdout(predicate::str::contains("found 0.80.2, expected 0.81.0"))
        .stdout(predicate::str::contains("[OK] src/flet_cli/cli.py: command import"))
        .stderr(predicate::str::contains("2 of 8 checks"));
}

#[test]
fn test_verify_empty_directory() {
    let project = TestProject::new().unwrap();
    project
        .cmd()
        .arg("verify")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("verification failed"));
}

#[test]
fn test_quiet_prints_only_failures() {
    let project = TestProject::integrated_fork("0.80.2").unwrap();
    project.cmd().args(["--quiet", "verify"]).assert().success().stdout(predicate::str::is_empty());
}
