//! `packn-sync integrate <VERSION>`: merge one upstream release into a directory.

use anyhow::{Context, Result};
use clap::Args;
use std::path::{Path, PathBuf};
use tracing::{error, info};

use crate::cli::{CliConfig, Reporter, dir_or_cwd};
use crate::config::SyncConfig;
use crate::integrate::{
    BackupManager, IntegrationContext, TreePatchSummary, patch_tree, place_custom_module,
    read_custom_module, stage_preserving_module, verify_integration,
};
use crate::upstream::{ReleaseClient, extract_tar_gz, find_extracted_root};
use crate::version::ReleaseVersion;

#[derive(Args)]
pub struct IntegrateCommand {
    /// Upstream version to integrate, e.g. 0.80.2
    version: String,

    /// Directory containing the custom command module [default: current directory]
    #[arg(long, value_name = "DIR")]
    source: Option<PathBuf>,

    /// Directory to update [default: --source]
    #[arg(long, value_name = "DIR")]
    output: Option<PathBuf>,

    /// Do not back up the output directory before staging
    #[arg(long)]
    no_backup: bool,

    /// Skip post-integration verification
    #[arg(long)]
    no_verify: bool,

    /// Use a local .tar.gz instead of downloading the release
    #[arg(long, value_name = "FILE")]
    offline_archive: Option<PathBuf>,
}

impl IntegrateCommand {
    pub async fn execute(self, cli: &CliConfig) -> Result<()> {
        // Reject malformed versions before touching the network or disk
        let version: ReleaseVersion = self.version.parse()?;
        let source = dir_or_cwd(self.source.clone())?;
        let output = self.output.clone().unwrap_or_else(|| source.clone());
        let config = cli.load_sync_config(&source).await?;
        let reporter = cli.reporter();

        let module = read_custom_module(&source, &config.command)?;

        reporter.banner(&format!(
            "Integrating {} {} with the {} command",
            config.command.distribution_name(),
            version,
            config.command.name
        ));
        reporter.detail(format!("Source: {}", source.display()));
        reporter.detail(format!("Output: {}", output.display()));

        let ctx = IntegrationContext::new(version, config)?;
        let archive = self.obtain_archive(&ctx, &reporter).await?;

        reporter.step("Extracting archive...");
        let entries = extract_tar_gz(&archive, &ctx.extract_dir())?;
        let upstream_root = find_extracted_root(&ctx.extract_dir())?;
        reporter.ok(format!("Extracted {entries} entries"));

        if self.no_backup {
            reporter.info("Backup skipped");
        } else {
            reporter.step("Backing up output directory...");
            let backup = BackupManager::new(&output, &ctx.version_string());
            let saved = backup.create_backup(&ctx.config.staging.backup_items)?;
            reporter.ok(format!("Saved {} items to {}", saved.len(), backup.backup_path().display()));
        }

        reporter.step(format!("Adding the {} command...", ctx.config.command.name));
        place_custom_module(&upstream_root, &ctx.config.command, &module)?;
        let summary = patch_tree(&upstream_root, &ctx.version_string(), &ctx.config)?;
        report_patches(&reporter, &summary);

        reporter.step(format!("Copying files to {}...", output.display()));
        let staged = match stage_preserving_module(
            &upstream_root,
            &output,
            &ctx.config.staging.integrate_items,
            &ctx.config.command,
            Some(&module),
        ) {
            Ok(staged) => staged,
            Err(e) => {
                error!("Staging failed: {:#}", e);
                restore_after_failure(&output, &ctx, self.no_backup, &reporter);
                return Err(e.context("Failed to copy the integrated tree into the output directory"));
            }
        };
        for item in &staged.copied {
            reporter.ok(item);
        }
        for item in &staged.skipped {
            reporter.warn(format!("{item} not found upstream, kept existing"));
        }

        // The output may carry files the extracted tree lacked
        patch_tree(&output, &ctx.version_string(), &ctx.config)
            .context("Failed to patch the output directory")?;

        if self.no_verify {
            reporter.info("Verification skipped");
        } else {
            let report = verify_integration(&output, &ctx.config, Some(&ctx.version_string()));
            reporter.verification(&report);
            if !report.passed() {
                reporter.outcome(false, "Integration completed with verification failures");
            }
            report.into_result()?;
        }

        info!("Integrated {} into {}", ctx.version, output.display());
        reporter.outcome(true, &format!("Integrated version {}", ctx.version));
        reporter.next_steps(&next_steps(&ctx.config));
        Ok(())
    }

    async fn obtain_archive(&self, ctx: &IntegrationContext, reporter: &Reporter) -> Result<PathBuf> {
        if let Some(path) = &self.offline_archive {
            reporter.step(format!("Using local archive {}", path.display()));
            if !path.is_file() {
                anyhow::bail!("Archive not found: {}", path.display());
            }
            return Ok(path.clone());
        }

        reporter.step(format!(
            "Downloading {} {}...",
            ctx.config.command.distribution_name(),
            ctx.version
        ));
        let client = ReleaseClient::new(ctx.config.upstream.clone(), None)?;
        let downloaded = client.download_source_archive(&ctx.version, ctx.workspace()).await?;
        if downloaded.from_fallback {
            reporter.warn("Release asset not found, using the tag source archive");
        }
        reporter.ok(format!("Downloaded {}", downloaded.url));
        Ok(downloaded.path)
    }
}

fn restore_after_failure(output: &Path, ctx: &IntegrationContext, no_backup: bool, reporter: &Reporter) {
    if no_backup {
        return;
    }
    let backup = BackupManager::new(output, &ctx.version_string());
    if !backup.backup_exists() {
        return;
    }
    reporter.warn("Restoring output directory from backup");
    if let Err(e) = backup.restore_backup(&ctx.config.staging.backup_items) {
        reporter.fail(format!("Restore failed: {e:#}"));
    }
}

pub(crate) fn report_patches(reporter: &Reporter, summary: &TreePatchSummary) {
    if let Some(registry) = &summary.registry {
        for name in &registry.applied {
            reporter.ok(format!("Applied {name}"));
        }
        if !registry.changed() && registry.missing_anchor.is_empty() {
            reporter.info("Command registry: no changes");
        }
    }
    if let Some(manifest) = &summary.manifest {
        if manifest.versions_updated > 0 {
            reporter.ok("Updated version");
        }
        if manifest.description_updated {
            reporter.ok("Updated description");
        }
        for name in &manifest.rules.applied {
            reporter.ok(format!("Applied {name}"));
        }
    }
    if summary.packaging_manifest_created {
        reporter.ok("Created MANIFEST.in");
    }
    for name in summary.missing_anchors() {
        reporter.warn(format!("Skipped {name}: anchor not found"));
    }
}

fn next_steps(config: &SyncConfig) -> Vec<String> {
    vec![
        "Review the changes: git diff".to_string(),
        "Build the package: python -m build".to_string(),
        "Install locally: pip install -e .".to_string(),
        format!("Try the command: {} {} --help", config.command.distribution_name(), config.command.name),
    ]
}
