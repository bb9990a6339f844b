//! Fixtures shaped like the upstream flet-cli sources.

use anyhow::{Context, Result, bail};
use flate2::Compression;
use flate2::write::GzEncoder;
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use tar::{Builder, EntryType, Header};

/// `cli.py` as shipped upstream, before the custom command is registered.
pub const UPSTREAM_CLI_PY: &str = r#"import argparse
import sys

import flet_cli.commands.build
import flet_cli.commands.create
import flet_cli.commands.pack
import flet_cli.commands.publish
from flet_cli.version import version


def get_parser() -> argparse.ArgumentParser:
    parser = argparse.ArgumentParser()
    sp = parser.add_subparsers(dest="command")

    flet_cli.commands.create.Command.register_to(sp, "create")
    flet_cli.commands.build.Command.register_to(sp, "build")
    flet_cli.commands.pack.Command.register_to(sp, "pack")
    flet_cli.commands.publish.Command.register_to(sp, "publish")

    return parser


def main():
    parser = get_parser()
    args = parser.parse_args()
    if "handler" in args:
        args.handler(args)
    else:
        parser.print_help()
        sys.exit(1)
"#;

/// The fork's command module.
pub const CUSTOM_MODULE: &str = r#"import argparse

from flet_cli.commands.base import BaseCommand


class Command(BaseCommand):
    """Package a Flet app with Nuitka."""

    def add_arguments(self, parser: argparse.ArgumentParser) -> None:
        parser.add_argument("script", nargs="?", default="main.py")

    def handle(self, options: argparse.Namespace) -> None:
        print(f"packaging {options.script}")
"#;

/// Upstream `pyproject.toml` for `version`.
#[must_use]
pub fn upstream_pyproject(version: &str) -> String {
    format!(
        r#"[project]
name = "flet-cli"
version = "{version}"
description = "Flet CLI"
authors = [{{ name = "Appveyor Systems Inc.", email = "hello@flet.dev" }}]
license = "Apache-2.0"
readme = "README.md"
requires-python = ">=3.10"
dependencies = [
    "watchdog >=4.0.0",
    "packaging",
]

[project.urls]
Homepage = "https://flet.dev"
Repository = "https://github.com/flet-dev/flet"

[build-system]
requires = ["setuptools"]
build-backend = "setuptools.build_meta"
"#
    )
}

/// One member of a test archive.
///
/// Paths are written into the tar header verbatim, so members such as
/// `../escaped.txt` that `tar::Builder` itself refuses can be produced.
#[derive(Debug, Clone)]
pub struct ArchiveMember {
    pub path: String,
    pub kind: MemberKind,
    pub mode: u32,
}

#[derive(Debug, Clone)]
pub enum MemberKind {
    File(Vec<u8>),
    Dir,
    Symlink(String),
    HardLink(String),
}

impl ArchiveMember {
    pub fn file(path: &str, content: impl AsRef<[u8]>) -> Self {
        Self {
            path: path.to_string(),
            kind: MemberKind::File(content.as_ref().to_vec()),
            mode: 0o644,
        }
    }

    pub fn dir(path: &str) -> Self {
        Self {
            path: path.to_string(),
            kind: MemberKind::Dir,
            mode: 0o755,
        }
    }

    pub fn symlink(path: &str, target: &str) -> Self {
        Self {
            path: path.to_string(),
            kind: MemberKind::Symlink(target.to_string()),
            mode: 0o777,
        }
    }

    pub fn hard_link(path: &str, target: &str) -> Self {
        Self {
            path: path.to_string(),
            kind: MemberKind::HardLink(target.to_string()),
            mode: 0o644,
        }
    }

    #[must_use]
    pub fn with_mode(mut self, mode: u32) -> Self {
        self.mode = mode;
        self
    }
}

fn set_raw(field: &mut [u8], value: &str) -> Result<()> {
    let bytes = value.as_bytes();
    if bytes.len() > field.len() {
        bail!("archive member name too long for a test header: {value}");
    }
    field[..bytes.len()].copy_from_slice(bytes);
    Ok(())
}

/// Write `members` as a gzip-compressed tar file at `path`.
pub fn write_tar_gz(path: &Path, members: &[ArchiveMember]) -> Result<()> {
    let file = File::create(path).with_context(|| format!("Failed to create {}", path.display()))?;
    let mut builder = Builder::new(GzEncoder::new(file, Compression::default()));

    for member in members {
        let mut header = Header::new_gnu();
        set_raw(&mut header.as_old_mut().name, &member.path)?;
        header.set_mode(member.mode);
        header.set_mtime(0);

        let data: &[u8] = match &member.kind {
            MemberKind::File(content) => {
                header.set_entry_type(EntryType::Regular);
                header.set_size(content.len() as u64);
                content.as_slice()
            }
            MemberKind::Dir => {
                header.set_entry_type(EntryType::Directory);
                header.set_size(0);
                &[]
            }
            MemberKind::Symlink(target) | MemberKind::HardLink(target) => {
                let entry_type = if matches!(member.kind, MemberKind::Symlink(_)) {
                    EntryType::Symlink
                } else {
                    EntryType::Link
                };
                header.set_entry_type(entry_type);
                header.set_size(0);
                set_raw(&mut header.as_old_mut().linkname, target)?;
                &[]
            }
        };

        header.set_cksum();
        builder.append(&header, data)?;
    }

    builder.into_inner()?.finish()?;
    Ok(())
}

/// An extracted upstream release laid out as `flet-<version>/...`.
#[derive(Debug, Clone)]
pub struct UpstreamTreeFixture {
    pub version: String,
    pub root_name: String,
    pub cli_py: String,
    pub pyproject: String,
}

impl UpstreamTreeFixture {
    pub fn new(version: &str) -> Self {
        Self {
            version: version.to_string(),
            root_name: format!("flet-{version}"),
            cli_py: UPSTREAM_CLI_PY.to_string(),
            pyproject: upstream_pyproject(version),
        }
    }

    /// Relative paths and contents of every file in the tree.
    pub fn files(&self) -> Vec<(String, String)> {
        vec![
            ("src/flet_cli/__init__.py".into(), String::new()),
            ("src/flet_cli/cli.py".into(), self.cli_py.clone()),
            ("src/flet_cli/commands/__init__.py".into(), String::new()),
            (
                "src/flet_cli/commands/pack.py".into(),
                "class Command:\n    pass\n".into(),
            ),
            (
                "src/flet_cli/version.py".into(),
                format!("version = \"{}\"\n", self.version),
            ),
            ("pyproject.toml".into(), self.pyproject.clone()),
            ("README.md".into(), "# Flet CLI\n".into()),
            ("LICENSE".into(), "Apache License 2.0\n".into()),
        ]
    }

    /// Write the tree under `dir` and return its root.
    pub fn write_to(&self, dir: &Path) -> Result<PathBuf> {
        let root = dir.join(&self.root_name);
        for (relative, content) in self.files() {
            let path = root.join(relative);
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::write(&path, content)
                .with_context(|| format!("Failed to write fixture {}", path.display()))?;
        }
        Ok(root)
    }

    /// Pack the tree into a `.tar.gz` at `path`.
    pub fn write_archive(&self, path: &Path) -> Result<()> {
        let mut members = vec![ArchiveMember::dir(&format!("{}/", self.root_name))];
        members.extend(
            self.files()
                .into_iter()
                .map(|(relative, content)| {
                    ArchiveMember::file(&format!("{}/{relative}", self.root_name), content)
                }),
        );
        write_tar_gz(path, &members)
    }
}
