use predicates::prelude::*;
use std::fs;

use packn_sync::test_utils::{ArchiveMember, CUSTOM_MODULE, write_tar_gz};

use crate::common::{MODULE_PATH, REGISTRY_PATH, TestProject, snapshot};

#[test]
fn test_integrate_offline_archive() {
    let project = TestProject::with_custom_module().unwrap();
    let archive = project.upstream_archive("0.80.2").unwrap();

    project
        .cmd()
        .args(["integrate", "0.80.2", "--offline-archive"])
        .arg(&archive)
        .assert()
        .success()
        .stdout(predicate::str::contains("Integrated version 0.80.2"))
        .stdout(predicate::str::contains("flet-cli packn --help"));

    let registry = project.read_fork_file(REGISTRY_PATH);
    assert!(registry.contains("import flet_cli.commands.packn"));
    assert!(registry.contains("flet_cli.commands.packn.Command.register_to(sp, \"packn\")"));

    let pyproject = project.read_fork_file("pyproject.toml");
    assert!(pyproject.contains("version = \"0.80.2\""));
    assert!(pyproject.contains("maintainers = [{ name = \"LingyeSoul\""));
    assert!(pyproject.contains("[project.optional-dependencies]"));
    assert!(pyproject.parse::<toml_edit::DocumentMut>().is_ok());

    assert!(project.read_fork_file("MANIFEST.in").contains("src/flet_cli/__pyinstaller"));
    assert_eq!(project.read_fork_file(MODULE_PATH), CUSTOM_MODULE);
    assert!(project.fork_path().join(".backup_0.80.2").join("src").exists());
}

#[test]
fn test_integrate_twice_is_byte_identical() {
    let project = TestProject::with_custom_module().unwrap();
    let archive = project.upstream_archive("0.80.2").unwrap();
    let run = || {
        project
            .cmd()
            .args(["integrate", "0.80.2", "--no-backup", "--offline-archive"])
            .arg(&archive)
            .assert()
            .success();
    };

    run();
    let first = snapshot(project.fork_path());
    run();
    assert_eq!(first, snapshot(project.fork_path()));

    let registry = project.read_fork_file(REGISTRY_PATH);
    assert_eq!(registry.matches("import flet_cli.commands.packn").count(), 1);
    assert!(!project.fork_path().join(".backup_0.80.2").exists());
}

#[test]
fn test_integrate_into_separate_output() {
    let project = TestProject::with_custom_module().unwrap();
    let archive = project.upstream_archive("0.81.0").unwrap();
    let output = project.root().join("out");
    fs::create_dir_all(&output).unwrap();

    project
        .cmd()
        .args(["integrate", "0.81.0", "--no-backup", "--offline-archive"])
        .arg(&archive)
        .arg("--output")
        .arg(&output)
        .assert()
        .success();

    assert!(output.join(MODULE_PATH).is_file());
    assert!(output.join("LICENSE").is_file());
    // The source only ever provides the module
    assert!(!project.fork_path().join(REGISTRY_PATH).exists());
}

#[test]
fn test_integrate_rejects_traversal_archive() {
    let project = TestProject::with_custom_module().unwrap();
    let archive = project.root().join("evil.tar.gz");
    write_tar_gz(
        &archive,
        &[
            ArchiveMember::dir("flet-0.80.2/"),
            ArchiveMember::file("flet-0.80.2/ok.txt", "fine"),
            ArchiveMember::file("flet-0.80.2/../../escaped.txt", "pwned"),
        ],
    )
    .unwrap();

    project
        .cmd()
        .args(["integrate", "0.80.2", "--offline-archive"])
        .arg(&archive)
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Path traversal detected"));

    assert!(!project.root().join("escaped.txt").exists());
    assert!(!project.fork_path().join(REGISTRY_PATH).exists());
    assert!(!project.fork_path().join(".backup_0.80.2").exists());
}

#[test]
fn test_integrate_missing_module() {
    let project = TestProject::new().unwrap();
    let archive = project.upstream_archive("0.80.2").unwrap();

    project
        .cmd()
        .args(["integrate", "0.80.2", "--offline-archive"])
        .arg(&archive)
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Command module not found"));
}

#[test]
fn test_integrate_missing_sibling_anchor_fails_verification() {
    let project = TestProject::with_custom_module().unwrap();
    let archive = project.root().join("renamed.tar.gz");
    // Upstream renamed its pack command; the registration anchor is gone
    write_tar_gz(
        &archive,
        &[
            ArchiveMember::dir("flet-0.90.0/"),
            ArchiveMember::file("flet-0.90.0/src/flet_cli/cli.py", "import argparse\n"),
            ArchiveMember::file(
                "flet-0.90.0/pyproject.toml",
                "[project]\nname = \"flet-cli\"\nversion = \"0.90.0\"\n",
            ),
        ],
    )
    .unwrap();

    project
        .cmd()
        .args(["integrate", "0.90.0", "--no-backup", "--offline-archive"])
        .arg(&archive)
        .assert()
        .code(1)
        .stdout(predicate::str::contains("anchor not found"))
        .stdout(predicate::str::contains("[FAIL] src/flet_cli/cli.py: command import"));

    project
        .cmd()
        .args(["integrate", "0.90.0", "--no-backup", "--no-verify", "--offline-archive"])
        .arg(&archive)
        .assert()
        .success();
}

#[test]
fn test_integrate_missing_archive_file() {
    let project = TestProject::with_custom_module().unwrap();
    project
        .cmd()
        .args(["integrate", "0.80.2", "--offline-archive", "does-not-exist.tar.gz"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Archive not found"));
}
