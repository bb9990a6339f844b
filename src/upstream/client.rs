//! GitHub REST client for upstream releases and fork pull requests.
//!
//! Every request uses the configured timeout and is attempted once. A 404 is
//! reported as [`SyncError::ReleaseNotFound`] so the archive download can fall
//! back to the tag archive URL; any other non-success status is
//! [`SyncError::HttpStatus`].
//!
//! The access token is only sent to the API host, never to download URLs.

use reqwest::{Client, RequestBuilder, Response, StatusCode, header};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info, warn};

use crate::config::UpstreamConfig;
use crate::constants::USER_AGENT;
use crate::core::SyncError;
use crate::version::ReleaseVersion;

const GITHUB_JSON: &str = "application/vnd.github+json";

#[derive(Debug, Clone, Deserialize)]
pub struct GitHubAsset {
    pub name: String,
    pub browser_download_url: String,
    #[serde(default)]
    pub size: u64,
    #[serde(default)]
    pub digest: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GitHubRelease {
    pub tag_name: String,
    #[serde(default)]
    pub html_url: String,
    #[serde(default)]
    pub assets: Vec<GitHubAsset>,
}

impl GitHubRelease {
    pub fn find_asset(&self, name: &str) -> Option<&GitHubAsset> {
        self.assets.iter().find(|asset| asset.name == name)
    }
}

/// Body of `POST /repos/{repository}/pulls`.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct PullRequest {
    pub title: String,
    pub body: String,
    pub head: String,
    pub base: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreatedPullRequest {
    pub number: u64,
    #[serde(default)]
    pub html_url: String,
}

/// A source archive saved to disk.
#[derive(Debug, Clone)]
pub struct DownloadedArchive {
    pub path: PathBuf,
    pub url: String,
    /// `true` when the release asset was missing and the tag archive was used.
    pub from_fallback: bool,
}

pub struct ReleaseClient {
    http: Client,
    config: UpstreamConfig,
    token: Option<String>,
}

impl ReleaseClient {
    pub fn new(config: UpstreamConfig, token: Option<String>) -> Result<Self, SyncError> {
        let http = Client::builder()
            .timeout(config.timeout())
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| SyncError::Network {
                operation: "initialize HTTP client".to_string(),
                reason: e.to_string(),
            })?;

        Ok(Self {
            http,
            config,
            token: token.filter(|t| !t.trim().is_empty()),
        })
    }

    #[must_use]
    pub const fn has_token(&self) -> bool {
        self.token.is_some()
    }

    #[must_use]
    pub fn latest_release_url(&self) -> String {
        format!(
            "{}/repos/{}/{}/releases/latest",
            self.config.api_base, self.config.owner, self.config.repo
        )
    }

    /// `{asset_prefix}-{version}.tar.gz`
    #[must_use]
    pub fn asset_name(&self, version: &ReleaseVersion) -> String {
        format!("{}-{}.tar.gz", self.config.asset_prefix, version)
    }

    #[must_use]
    pub fn asset_url(&self, version: &ReleaseVersion) -> String {
        format!(
            "{}/{}/{}/releases/download/{}/{}",
            self.config.web_base,
            self.config.owner,
            self.config.repo,
            version.tag(),
            self.asset_name(version)
        )
    }

    #[must_use]
    pub fn archive_url(&self, version: &ReleaseVersion) -> String {
        format!(
            "{}/{}/{}/archive/refs/tags/{}.tar.gz",
            self.config.web_base,
            self.config.owner,
            self.config.repo,
            version.tag()
        )
    }

    fn api_request(&self, builder: RequestBuilder) -> RequestBuilder {
        let builder = builder.header(header::ACCEPT, GITHUB_JSON);
        match &self.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    async fn send(&self, builder: RequestBuilder, url: &str, operation: &str) -> Result<Response, SyncError> {
        let response = builder.send().await.map_err(|e| network_error(operation, &e))?;
        check_status(response, url)
    }

    /// Fetch `releases/latest` for the upstream repository.
    pub async fn latest_release(&self) -> Result<GitHubRelease, SyncError> {
        let url = self.latest_release_url();
        debug!("Fetching latest release from {}", url);

        let response = self
            .send(self.api_request(self.http.get(&url)), &url, "fetch latest release")
            .await?;
        let release: GitHubRelease =
            response.json().await.map_err(|e| network_error("parse release metadata", &e))?;

        info!("Latest upstream release is {}", release.tag_name);
        Ok(release)
    }

    /// Download `url` into the file `dest`.
    pub async fn download(&self, url: &str, dest: &Path) -> Result<u64, SyncError> {
        debug!("Downloading {}", url);
        let response = self.send(self.http.get(url), url, "download archive").await?;
        let bytes = response.bytes().await.map_err(|e| network_error("download archive", &e))?;
        fs::write(dest, &bytes).await?;
        Ok(bytes.len() as u64)
    }

    /// Download the source archive for `version` into `dest_dir`.
    ///
    /// The release asset is tried first; on 404 the tag archive is used. Any
    /// other failure of the first request is returned as is.
    pub async fn download_source_archive(
        &self,
        version: &ReleaseVersion,
        dest_dir: &Path,
    ) -> Result<DownloadedArchive, SyncError> {
        let path = dest_dir.join(format!("flet-{version}.tar.gz"));
        let asset_url = self.asset_url(version);

        match self.download(&asset_url, &path).await {
            Ok(size) => {
                debug!("Downloaded {} bytes from {}", size, asset_url);
                Ok(DownloadedArchive {
                    path,
                    url: asset_url,
                    from_fallback: false,
                })
            }
            Err(SyncError::ReleaseNotFound {
                ..
            }) => {
                let archive_url = self.archive_url(version);
                warn!("Release asset not found at {}, trying {}", asset_url, archive_url);
                self.download(&archive_url, &path).await.map_err(|e| match e {
                    SyncError::ReleaseNotFound {
                        ..
                    } => SyncError::ReleaseNotFound {
                        url: format!("{asset_url} and {archive_url}"),
                    },
                    other => other,
                })?;
                Ok(DownloadedArchive {
                    path,
                    url: archive_url,
                    from_fallback: true,
                })
            }
            Err(e) => Err(e),
        }
    }

    /// Open a pull request on `repository` (`owner/name`).
    pub async fn create_pull_request(
        &self,
        repository: &str,
        pull_request: &PullRequest,
    ) -> Result<CreatedPullRequest, SyncError> {
        if self.token.is_none() {
            return Err(SyncError::Other {
                message: "A GitHub token is required to create pull requests".to_string(),
            });
        }

        let url = format!("{}/repos/{}/pulls", self.config.api_base, repository);
        debug!("Creating pull request {} -> {} on {}", pull_request.head, pull_request.base, repository);

        let response = self
            .send(
                self.api_request(self.http.post(&url)).json(pull_request),
                &url,
                "create pull request",
            )
            .await?;
        response.json().await.map_err(|e| network_error("parse pull request response", &e))
    }
}

fn check_status(response: Response, url: &str) -> Result<Response, SyncError> {
    let status = response.status();
    if status == StatusCode::NOT_FOUND {
        return Err(SyncError::ReleaseNotFound {
            url: url.to_string(),
        });
    }
    if !status.is_success() {
        return Err(SyncError::HttpStatus {
            url: url.to_string(),
            status: status.as_u16(),
        });
    }
    Ok(response)
}

fn network_error(operation: &str, error: &reqwest::Error) -> SyncError {
    let reason = if error.is_timeout() {
        format!("request timed out: {error}")
    } else {
        error.to_string()
    };
    SyncError::Network {
        operation: operation.to_string(),
        reason,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{MockResponse, MockServer};
    use tempfile::TempDir;

    fn client_for(server: &MockServer, token: Option<&str>) -> ReleaseClient {
        let config = UpstreamConfig {
            api_base: server.url(),
            web_base: server.url(),
            ..UpstreamConfig::default()
        };
        ReleaseClient::new(config, token.map(String::from)).unwrap()
    }

    fn version(v: &str) -> ReleaseVersion {
        v.parse().unwrap()
    }

    #[test]
    fn test_default_urls() {
        let client = ReleaseClient::new(UpstreamConfig::default(), None).unwrap();
        let v = version("0.80.2");
        assert_eq!(
            client.latest_release_url(),
            "https://api.github.com/repos/flet-dev/flet/releases/latest"
        );
        assert_eq!(
            client.asset_url(&v),
            "https://github.com/flet-dev/flet/releases/download/v0.80.2/flet_cli-0.80.2.tar.gz"
        );
        assert_eq!(
            client.archive_url(&v),
            "https://github.com/flet-dev/flet/archive/refs/tags/v0.80.2.tar.gz"
        );
    }

    #[test]
    fn test_blank_token_is_ignored() {
        let client = ReleaseClient::new(UpstreamConfig::default(), Some("  ".into())).unwrap();
        assert!(!client.has_token());
    }

    #[test]
    fn test_release_deserialization() {
        let release: GitHubRelease = serde_json::from_str(
            r#"{
                "tag_name": "v0.80.2",
                "html_url": "https://github.com/flet-dev/flet/releases/tag/v0.80.2",
                "assets": [
                    {"name": "flet_cli-0.80.2.tar.gz",
                     "browser_download_url": "https://example.invalid/a",
                     "size": 10,
                     "digest": "sha256:abc"},
                    {"name": "other.zip", "browser_download_url": "https://example.invalid/b"}
                ]
            }"#,
        )
        .unwrap();

        assert_eq!(release.tag_name, "v0.80.2");
        let asset = release.find_asset("flet_cli-0.80.2.tar.gz").unwrap();
        assert_eq!(asset.digest.as_deref(), Some("sha256:abc"));
        assert!(release.find_asset("other.zip").unwrap().digest.is_none());
        assert!(release.find_asset("missing").is_none());
    }

    #[test]
    fn test_pull_request_body() {
        let pr = PullRequest {
            title: "Update flet-cli to v0.80.2".into(),
            body: "Automated update".into(),
            head: "update/flet-cli-0.80.2".into(),
            base: "main".into(),
        };
        let json = serde_json::to_value(&pr).unwrap();
        assert_eq!(json["head"], "update/flet-cli-0.80.2");
        assert_eq!(json["base"], "main");
        assert_eq!(json.as_object().unwrap().len(), 4);
    }

    #[tokio::test]
    async fn test_latest_release_sends_token_to_api() {
        let server = MockServer::start(vec![(
            "GET",
            "/repos/flet-dev/flet/releases/latest",
            MockResponse::json(200, r#"{"tag_name": "v0.81.0"}"#),
        )]);
        let client = client_for(&server, Some("secret"));

        let release = client.latest_release().await.unwrap();
        assert_eq!(release.tag_name, "v0.81.0");

        let requests = server.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].header("authorization").as_deref(), Some("Bearer secret"));
        assert_eq!(requests[0].header("accept").as_deref(), Some(GITHUB_JSON));
    }

    #[tokio::test]
    async fn test_download_falls_back_on_404() {
        let server = MockServer::start(vec![(
            "GET",
            "/flet-dev/flet/archive/refs/tags/v0.80.2.tar.gz",
            MockResponse::bytes(200, b"archive-bytes".to_vec()),
        )]);
        let client = client_for(&server, Some("secret"));
        let temp = TempDir::new().unwrap();

        let downloaded =
            client.download_source_archive(&version("0.80.2"), temp.path()).await.unwrap();
        assert!(downloaded.from_fallback);
        assert_eq!(std::fs::read(&downloaded.path).unwrap(), b"archive-bytes");

        let requests = server.requests();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[0].path, "/flet-dev/flet/releases/download/v0.80.2/flet_cli-0.80.2.tar.gz");
        // Download hosts never see the token
        assert!(requests.iter().all(|r| r.header("authorization").is_none()));
    }

    #[tokio::test]
    async fn test_server_error_does_not_fall_back() {
        let server = MockServer::start(vec![(
            "GET",
            "/flet-dev/flet/releases/download/v0.80.2/flet_cli-0.80.2.tar.gz",
            MockResponse::bytes(500, Vec::new()),
        )]);
        let client = client_for(&server, None);
        let temp = TempDir::new().unwrap();

        let err = client.download_source_archive(&version("0.80.2"), temp.path()).await.unwrap_err();
        assert!(matches!(err, SyncError::HttpStatus { status: 500, .. }));
        assert_eq!(server.requests().len(), 1);
    }

    #[tokio::test]
    async fn test_both_urls_missing() {
        crate::test_utils::init_test_logging(None);
        let server = MockServer::start(Vec::new());
        let client = client_for(&server, None);
        let temp = TempDir::new().unwrap();

        let err = client.download_source_archive(&version("9.9.9"), temp.path()).await.unwrap_err();
        match err {
            SyncError::ReleaseNotFound {
                url,
            } => {
                assert!(url.contains("releases/download/v9.9.9"));
                assert!(url.contains("archive/refs/tags/v9.9.9"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_create_pull_request() {
        let server = MockServer::start(vec![(
            "POST",
            "/repos/me/flet-cli/pulls",
            MockResponse::json(201, r#"{"number": 7, "html_url": "https://example.invalid/pr/7"}"#),
        )]);
        let client = client_for(&server, Some("secret"));
        let pr = PullRequest {
            title: "t".into(),
            body: "b".into(),
            head: "update/flet-cli-1.0.0".into(),
            base: "main".into(),
        };

        let created = client.create_pull_request("me/flet-cli", &pr).await.unwrap();
        assert_eq!(created.number, 7);

        let requests = server.requests();
        let sent: serde_json::Value = serde_json::from_slice(&requests[0].body).unwrap();
        assert_eq!(sent["head"], "update/flet-cli-1.0.0");
        assert_eq!(requests[0].header("authorization").as_deref(), Some("Bearer secret"));
    }

    #[tokio::test]
    async fn test_create_pull_request_requires_token() {
        let client = ReleaseClient::new(UpstreamConfig::default(), None).unwrap();
        let pr = PullRequest {
            title: "t".into(),
            body: "b".into(),
            head: "h".into(),
            base: "main".into(),
        };
        assert!(client.create_pull_request("me/fork", &pr).await.is_err());
    }
}
