//! Registration of the custom command in `cli.py`.
//!
//! Two insertions, each keyed to the matching line of the sibling command:
//!
//! ```text
//! import flet_cli.commands.pack
//! import flet_cli.commands.packn                                  <- inserted
//! ...
//!     flet_cli.commands.pack.Command.register_to(sp, "pack")
//!     flet_cli.commands.packn.Command.register_to(sp, "packn")    <- inserted
//! ```

use std::path::Path;
use tracing::warn;

use super::{Anchor, PatchOutcome, PatchRule, Placement, patch_file};
use crate::config::CommandConfig;

pub fn registry_rules(command: &CommandConfig) -> Vec<PatchRule> {
    let import = command.import_line();
    let registration = command.registration_line();

    vec![
        PatchRule::new(
            "command import",
            import.clone(),
            Anchor::line(&command.sibling_import_line()),
            Placement::After,
            format!("{import}\n"),
        ),
        PatchRule::new(
            "command registration",
            registration.clone(),
            Anchor::line(&command.sibling_registration_line()),
            Placement::After,
            format!("{registration}\n"),
        )
        .with_matching_indent(),
    ]
}

/// Patch the registry file under `project_root`.
///
/// Returns `None` when the project has no registry file.
pub fn patch_registry(
    project_root: &Path,
    command: &CommandConfig,
) -> anyhow::Result<Option<PatchOutcome>> {
    let path = project_root.join(command.registry_path());
    if !path.exists() {
        warn!("Command registry not found at {}", path.display());
        return Ok(None);
    }
    patch_file(&path, &registry_rules(command)).map(Some)
}
