//! `packn-sync verify`: check an integrated tree without modifying it.

use anyhow::Result;
use clap::Args;
use std::path::PathBuf;

use crate::cli::{CliConfig, dir_or_cwd};
use crate::integrate::verify_integration;

#[derive(Args)]
pub struct VerifyCommand {
    /// Project root to check [default: current directory]
    #[arg(long, value_name = "DIR")]
    repo_dir: Option<PathBuf>,

    /// Also require the project manifest to carry this version
    #[arg(long, value_name = "VERSION")]
    expect_version: Option<String>,
}

impl VerifyCommand {
    pub async fn execute(self, cli: &CliConfig) -> Result<()> {
        let root = dir_or_cwd(self.repo_dir)?;
        let config = cli.load_sync_config(&root).await?;
        let reporter = cli.reporter();

        reporter.banner(&format!("Verifying {}", root.display()));
        let report = verify_integration(&root, &config, self.expect_version.as_deref());
        reporter.verification(&report);

        if report.passed() {
            reporter.outcome(true, &format!("All {} checks passed", report.checks.len()));
        } else {
            reporter.outcome(
                false,
                &format!("{} of {} checks failed", report.failed().len(), report.checks.len()),
            );
        }
        report.into_result()?;
        Ok(())
    }
}
