use predicates::prelude::*;

use crate::common::TestProject;

#[test]
fn test_help_lists_commands() {
    let project = TestProject::new().unwrap();
    project
        .cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("integrate"))
        .stdout(predicate::str::contains("auto-update"))
        .stdout(predicate::str::contains("verify"));
}

#[test]
fn test_version_flag() {
    let project = TestProject::new().unwrap();
    project
        .cmd()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn test_invalid_version_is_rejected() {
    let project = TestProject::with_custom_module().unwrap();
    for version in ["1.2", "v1.2.3", "v1.2.3.4", "1.2.3-beta", "latest", "1.2.3; rm -rf /"] {
        project
            .cmd()
            .args(["integrate", version])
            .assert()
            .code(1)
            .stderr(predicate::str::contains("Invalid version format"));
    }
    // Nothing was written before the version was rejected
    assert!(!project.fork_path().join("pyproject.toml").exists());
}

#[test]
fn test_unknown_command_fails() {
    let project = TestProject::new().unwrap();
    project.cmd().arg("deploy").assert().failure();
}

#[test]
fn test_malformed_config_file() {
    let project = TestProject::new().unwrap();
    let config = project.root().join("broken.toml");
    std::fs::write(&config, "[upstream\nowner = 1\n").unwrap();

    project
        .cmd()
        .args(["verify", "--config"])
        .arg(&config)
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Invalid configuration file"));
}
