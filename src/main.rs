//! packn-sync CLI entry point
//!
//! - `integrate <VERSION>` - merge an upstream release into a directory
//! - `auto-update` - merge the latest release, commit, push and open a PR
//! - `verify` - check an integrated tree

use anyhow::Result;
use clap::Parser;
use packn_sync::cli;
use packn_sync::core::user_friendly_error;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = cli::Cli::parse();

    #[cfg(windows)]
    colored::control::set_virtual_terminal(true).ok();

    match cli.execute().await {
        Ok(()) => Ok(()),
        Err(e) => {
            let error_ctx = user_friendly_error(e);
            error_ctx.display();
            std::process::exit(1);
        }
    }
}
