use predicates::prelude::*;
use sha2::{Digest, Sha256};
use std::fs;

use packn_sync::test_utils::{MockResponse, MockServer, UpstreamTreeFixture};

use crate::common::{MODULE_PATH, REGISTRY_PATH, TestProject};

const LATEST_PATH: &str = "/repos/flet-dev/flet/releases/latest";
const ASSET_PATH: &str = "/flet-dev/flet/releases/download/v0.81.0/flet_cli-0.81.0.tar.gz";
const TAG_ARCHIVE_PATH: &str = "/flet-dev/flet/archive/refs/tags/v0.81.0.tar.gz";
const PULLS_PATH: &str = "/repos/lingyesoul/flet-cli-packn/pulls";

fn release_json(tag: &str, digest: Option<&str>) -> String {
    let digest = digest.map(|d| format!(r#", "digest": "{d}""#)).unwrap_or_default();
    format!(
        r#"{{"tag_name": "{tag}", "html_url": "https://example.invalid/{tag}",
            "assets": [{{"name": "flet_cli-0.81.0.tar.gz",
                         "browser_download_url": "https://example.invalid/a.tar.gz",
                         "size": 1{digest}}}]}}"#
    )
}

fn archive_bytes(project: &TestProject) -> Vec<u8> {
    let path = project.root().join("upstream-0.81.0.tar.gz");
    UpstreamTreeFixture::new("0.81.0").write_archive(&path).unwrap();
    fs::read(path).unwrap()
}

fn sha256(bytes: &[u8]) -> String {
    format!("sha256:{}", hex::encode(Sha256::digest(bytes)))
}

#[test]
fn test_already_up_to_date() {
    let project = TestProject::integrated_fork("0.81.0").unwrap();
    let server =
        MockServer::start(vec![("GET", LATEST_PATH, MockResponse::json(200, &release_json("v0.81.0", None)))]);
    let config = project.write_config(&server.url()).unwrap();

    project
        .cmd()
        .arg("auto-update")
        .arg("--config")
        .arg(&config)
        .assert()
        .success()
        .stdout(predicate::str::contains("Already on latest version"));

    // Only the metadata request was made
    assert_eq!(server.requests().len(), 1);
    assert_eq!(project.git().commit_count().unwrap(), 1);
}

#[test]
fn test_update_commits_and_pushes_branch_and_opens_pr() {
    let project = TestProject::integrated_fork("0.80.2").unwrap();
    let remote = project.add_bare_remote().unwrap();
    let archive = archive_bytes(&project);
    let server = MockServer::start(vec![
        ("GET", LATEST_PATH, MockResponse::json(200, &release_json("v0.81.0", Some(&sha256(&archive))))),
        ("GET", ASSET_PATH, MockResponse::bytes(200, archive)),
        (
            "POST",
            PULLS_PATH,
            MockResponse::json(201, r#"{"number": 42, "html_url": "https://example.invalid/pull/42"}"#),
        ),
    ]);
    let config = project.write_config(&server.url()).unwrap();

    project
        .cmd()
        .args(["auto-update", "--create-pr", "--config"])
        .arg(&config)
        .env("GITHUB_TOKEN", "test-token")
        .env("GITHUB_REPOSITORY", "lingyesoul/flet-cli-packn")
        .assert()
        .success()
        .stdout(predicate::str::contains("Checksum verified"))
        .stdout(predicate::str::contains("Pull request #42"));

    let git = project.git();
    assert_eq!(git.get_current_branch().unwrap(), "update/flet-cli-0.81.0");
    assert_eq!(git.last_commit_message().unwrap(), "Update flet-cli to v0.81.0");
    assert_eq!(git.config_value("user.name").unwrap(), "github-actions[bot]");
    assert!(project.read_fork_file("pyproject.toml").contains("version = \"0.81.0\""));
    assert!(project.fork_path().join(MODULE_PATH).is_file());
    assert!(project.read_fork_file(REGISTRY_PATH).contains("import flet_cli.commands.packn"));

    let branches = std::process::Command::new("git")
        .args(["branch", "--list"])
        .current_dir(remote.repo_path())
        .output()
        .unwrap();
    assert!(String::from_utf8_lossy(&branches.stdout).contains("update/flet-cli-0.81.0"));

    let requests = server.requests();
    let metadata = requests.iter().find(|r| r.path == LATEST_PATH).unwrap();
    assert_eq!(metadata.header("authorization").as_deref(), Some("Bearer test-token"));
    let download = requests.iter().find(|r| r.path == ASSET_PATH).unwrap();
    assert_eq!(download.header("authorization"), None);

    let pr = requests.iter().find(|r| r.method == "POST").unwrap();
    let body: serde_json::Value = serde_json::from_slice(&pr.body).unwrap();
    assert_eq!(body["title"], "Update flet-cli to v0.81.0");
    assert_eq!(body["head"], "update/flet-cli-0.81.0");
    assert_eq!(body["base"], "main");
}

#[test]
fn test_update_without_token_skips_pr() {
    let project = TestProject::integrated_fork("0.80.2").unwrap();
    let archive = archive_bytes(&project);
    // No release asset: the tag archive is used instead
    let server = MockServer::start(vec![
        ("GET", LATEST_PATH, MockResponse::json(200, &release_json("v0.81.0", None))),
        ("GET", TAG_ARCHIVE_PATH, MockResponse::bytes(200, archive)),
    ]);
    let config = project.write_config(&server.url()).unwrap();

    project
        .cmd()
        .args(["auto-update", "--create-pr", "--no-push", "--config"])
        .arg(&config)
        .assert()
        .success()
        .stdout(predicate::str::contains("using the tag source archive"))
        .stdout(predicate::str::contains("Pull request skipped"));

    let git = project.git();
    assert_eq!(git.commit_count().unwrap(), 2);
    assert!(!server.requests().iter().any(|r| r.method == "POST"));
}

#[test]
fn test_digest_mismatch_aborts_before_changes() {
    let project = TestProject::integrated_fork("0.80.2").unwrap();
    let archive = archive_bytes(&project);
    let wrong = sha256(b"something else");
    let server = MockServer::start(vec![
        ("GET", LATEST_PATH, MockResponse::json(200, &release_json("v0.81.0", Some(&wrong)))),
        ("GET", ASSET_PATH, MockResponse::bytes(200, archive)),
    ]);
    let config = project.write_config(&server.url()).unwrap();
    let before = project.read_fork_file("pyproject.toml");

    project
        .cmd()
        .arg("auto-update")
        .arg("--config")
        .arg(&config)
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Checksum mismatch"));

    assert_eq!(project.read_fork_file("pyproject.toml"), before);
    assert!(project.git().status_porcelain().unwrap().is_empty());
}

#[test]
fn test_force_with_no_changes() {
    let project = TestProject::integrated_fork("0.81.0").unwrap();
    let archive = archive_bytes(&project);
    let server = MockServer::start(vec![
        ("GET", LATEST_PATH, MockResponse::json(200, &release_json("v0.81.0", None))),
        ("GET", ASSET_PATH, MockResponse::bytes(200, archive)),
    ]);
    let config = project.write_config(&server.url()).unwrap();

    project
        .cmd()
        .args(["auto-update", "--force", "--config"])
        .arg(&config)
        .assert()
        .success()
        .stdout(predicate::str::contains("No changes to commit"));

    assert_eq!(project.git().commit_count().unwrap(), 1);
}

#[test]
fn test_release_metadata_error() {
    let project = TestProject::integrated_fork("0.80.2").unwrap();
    let server = MockServer::start(vec![(
        "GET",
        LATEST_PATH,
        MockResponse::json(403, r#"{"message": "API rate limit exceeded"}"#),
    )]);
    let config = project.write_config(&server.url()).unwrap();

    project
        .cmd()
        .arg("auto-update")
        .arg("--config")
        .arg(&config)
        .assert()
        .code(1)
        .stderr(predicate::str::contains("HTTP 403"))
        .stderr(predicate::str::contains("GITHUB_TOKEN"));
}
