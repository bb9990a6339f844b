//! `packn-sync auto-update`: integrate the latest upstream release and publish it.
//!
//! Meant for a scheduled CI job. Exits 0 without changes when the fork is
//! already on the latest release.

use anyhow::{Context, Result};
use clap::Args;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::cli::integrate::report_patches;
use crate::cli::{CliConfig, Reporter, dir_or_cwd};
use crate::config::SyncConfig;
use crate::constants::PROJECT_MANIFEST;
use crate::git::{GitRepo, ensure_git_available};
use crate::integrate::{IntegrationContext, patch_tree, stage_preserving_module, verify_integration};
use crate::patch::read_version;
use crate::upstream::{
    ChecksumVerifier, GitHubRelease, PullRequest, ReleaseClient, extract_tar_gz,
    find_extracted_root,
};
use crate::version::{ReleaseVersion, is_up_to_date};

#[derive(Args)]
pub struct AutoUpdateCommand {
    /// Commit on an update branch and open a pull request
    #[arg(long)]
    create_pr: bool,

    /// Repository to update [default: current directory]
    #[arg(long, value_name = "DIR")]
    repo_dir: Option<PathBuf>,

    /// GitHub token for API calls and pull requests
    #[arg(long, env = "GITHUB_TOKEN", hide_env_values = true)]
    token: Option<String>,

    /// Repository to open the pull request on (owner/name)
    #[arg(long, env = "GITHUB_REPOSITORY")]
    repository: Option<String>,

    /// Ref being built; a branch ref is pushed to when no PR is created
    #[arg(long, env = "GITHUB_REF")]
    git_ref: Option<String>,

    /// Integrate even when already on the latest version
    #[arg(long)]
    force: bool,

    /// Commit but do not push
    #[arg(long)]
    no_push: bool,
}

impl AutoUpdateCommand {
    pub async fn execute(self, cli: &CliConfig) -> Result<()> {
        let repo_dir = dir_or_cwd(self.repo_dir.clone())?;
        let config = cli.load_sync_config(&repo_dir).await?;
        let reporter = cli.reporter();
        let client = ReleaseClient::new(config.upstream.clone(), self.token.clone())?;

        reporter.banner(&format!("Auto-update {}", config.command.distribution_name()));

        reporter.step("Checking for updates...");
        let release = client.latest_release().await?;
        let latest = ReleaseVersion::from_tag(&release.tag_name)?;
        let current = current_version(&repo_dir);
        reporter.detail(format!("Current version: {}", current.as_deref().unwrap_or("unknown")));
        reporter.detail(format!("Latest version:  {latest}"));

        if let Some(current) = &current
            && is_up_to_date(current, &latest.to_string())
        {
            if self.force {
                reporter.info("Already on latest version, continuing because of --force");
            } else {
                reporter.info("Already on latest version");
                return Ok(());
            }
        }

        let ctx = IntegrationContext::new(latest, config)?;
        self.integrate_release(&client, &release, &ctx, &repo_dir, &reporter).await?;
        self.publish(&client, &ctx, &repo_dir, &reporter).await
    }

    async fn integrate_release(
        &self,
        client: &ReleaseClient,
        release: &GitHubRelease,
        ctx: &IntegrationContext,
        repo_dir: &Path,
        reporter: &Reporter,
    ) -> Result<()> {
        reporter.step(format!("Downloading {}...", ctx.version));
        let downloaded = client.download_source_archive(&ctx.version, ctx.workspace()).await?;
        if downloaded.from_fallback {
            reporter.warn("Release asset not found, using the tag source archive");
        } else {
            let asset_name = client.asset_name(&ctx.version);
            match release.find_asset(&asset_name).and_then(|a| a.digest.as_deref()) {
                Some(digest) => {
                    if ChecksumVerifier::verify(&downloaded.path, digest, &asset_name).await? {
                        reporter.ok("Checksum verified");
                    }
                }
                None => debug!("No digest published for {}", asset_name),
            }
        }
        reporter.ok(format!("Downloaded {}", downloaded.url));

        reporter.step("Extracting archive...");
        extract_tar_gz(&downloaded.path, &ctx.extract_dir())?;
        let upstream_root = find_extracted_root(&ctx.extract_dir())?;

        reporter.step("Updating files...");
        let staged = stage_preserving_module(
            &upstream_root,
            repo_dir,
            &ctx.config.staging.update_items,
            &ctx.config.command,
            None,
        )?;
        for item in &staged.copied {
            reporter.ok(item);
        }
        for item in &staged.skipped {
            reporter.warn(format!("{item} not found upstream, kept existing"));
        }

        let summary = patch_tree(repo_dir, &ctx.version_string(), &ctx.config)?;
        report_patches(reporter, &summary);

        let report = verify_integration(repo_dir, &ctx.config, Some(&ctx.version_string()));
        reporter.verification(&report);
        report.into_result()?;
        Ok(())
    }

    async fn publish(
        &self,
        client: &ReleaseClient,
        ctx: &IntegrationContext,
        repo_dir: &Path,
        reporter: &Reporter,
    ) -> Result<()> {
        ensure_git_available()?;
        let repo = GitRepo::new(repo_dir);
        let git = &ctx.config.git;

        if client.has_token() {
            repo.configure_user(&git.bot_name, &git.bot_email).await?;
        }

        let branch = self.create_pr.then(|| git.update_branch(&ctx.version_string()));
        if let Some(branch) = &branch {
            reporter.step(format!("Switching to {branch}..."));
            repo.switch_to_branch(branch).await?;
        }

        reporter.step("Committing changes...");
        repo.add_existing(&ctx.config.staging.commit_paths).await?;
        if !repo.has_changes().await? {
            reporter.info("No changes to commit");
            return Ok(());
        }
        let message = commit_message(&ctx.config, &ctx.version);
        repo.commit(&message).await?;
        reporter.ok(&message);

        if self.no_push {
            reporter.info("Push skipped");
            if self.create_pr {
                reporter.warn("Pull request skipped because nothing was pushed");
            }
            return Ok(());
        }

        let refspec = match &branch {
            Some(branch) => branch.clone(),
            None => push_refspec(self.git_ref.as_deref()),
        };
        reporter.step(format!("Pushing {refspec} to {}...", git.remote));
        repo.push(&git.remote, Some(refspec.as_str())).await?;
        reporter.ok("Pushed");

        if let Some(branch) = branch {
            self.open_pull_request(client, ctx, branch, reporter).await?;
        }

        reporter.outcome(true, &format!("Updated to version {}", ctx.version));
        Ok(())
    }

    async fn open_pull_request(
        &self,
        client: &ReleaseClient,
        ctx: &IntegrationContext,
        branch: String,
        reporter: &Reporter,
    ) -> Result<()> {
        if !client.has_token() {
            reporter.warn("No GitHub token, skipping pull request");
            return Ok(());
        }
        let Some(repository) = self.repository.as_deref() else {
            reporter.warn("No repository given (--repository or GITHUB_REPOSITORY), skipping pull request");
            return Ok(());
        };

        reporter.step("Creating pull request...");
        let pull_request = pull_request_for(&ctx.config, &ctx.version, branch);
        let created = client
            .create_pull_request(repository, &pull_request)
            .await
            .with_context(|| format!("Failed to create pull request on {repository}"))?;
        info!("Opened pull request #{}", created.number);
        reporter.ok(format!("Pull request #{} {}", created.number, created.html_url));
        Ok(())
    }
}

/// Version recorded in the repository's project manifest, if readable.
fn current_version(repo_dir: &Path) -> Option<String> {
    let content = std::fs::read_to_string(repo_dir.join(PROJECT_MANIFEST)).ok()?;
    read_version(&content)
}

fn commit_message(config: &SyncConfig, version: &ReleaseVersion) -> String {
    format!("Update {} to v{}", config.command.distribution_name(), version)
}

fn pull_request_for(config: &SyncConfig, version: &ReleaseVersion, branch: String) -> PullRequest {
    PullRequest {
        title: commit_message(config, version),
        body: format!(
            "Automated update to {} v{} with {} integration.",
            config.command.distribution_name(),
            version,
            config.command.name
        ),
        head: branch,
        base: config.git.base_branch.clone(),
    }
}

/// `HEAD:refs/heads/<name>` for a branch ref, so detached checkouts can push;
/// `HEAD` otherwise.
fn push_refspec(git_ref: Option<&str>) -> String {
    match git_ref.and_then(|r| r.strip_prefix("refs/heads/")) {
        Some(branch) if !branch.is_empty() => format!("HEAD:refs/heads/{branch}"),
        _ => "HEAD".to_string(),
    }
}
