//! Coloured progress lines for the commands.
//!
//! ```text
//! [*] Downloading flet-cli 0.80.2...
//!     [OK] Downloaded
//!     [WARN] Release asset not found, using tag archive
//! ```
//!
//! `--quiet` suppresses everything except failures.

use colored::Colorize;

use crate::integrate::VerificationReport;

const RULE_WIDTH: usize = 60;

#[derive(Debug, Clone, Copy, Default)]
pub struct Reporter {
    quiet: bool,
}

impl Reporter {
    pub const fn new(quiet: bool) -> Self {
        Self {
            quiet,
        }
    }

    pub fn banner(&self, title: &str) {
        if self.quiet {
            return;
        }
        let rule = "=".repeat(RULE_WIDTH);
        println!("{rule}");
        println!("{}", title.bold());
        println!("{rule}");
    }

    pub fn step(&self, message: impl AsRef<str>) {
        if !self.quiet {
            println!("{} {}", "[*]".cyan(), message.as_ref());
        }
    }

    pub fn ok(&self, message: impl AsRef<str>) {
        if !self.quiet {
            println!("    {} {}", "[OK]".green(), message.as_ref());
        }
    }

    pub fn info(&self, message: impl AsRef<str>) {
        if !self.quiet {
            println!("    {} {}", "[INFO]".blue(), message.as_ref());
        }
    }

    pub fn detail(&self, message: impl AsRef<str>) {
        if !self.quiet {
            println!("    {}", message.as_ref().dimmed());
        }
    }

    pub fn warn(&self, message: impl AsRef<str>) {
        if !self.quiet {
            println!("    {} {}", "[WARN]".yellow(), message.as_ref());
        }
    }

    pub fn fail(&self, message: impl AsRef<str>) {
        println!("    {} {}", "[FAIL]".red(), message.as_ref());
    }

    /// Final outcome line framed by rules.
    pub fn outcome(&self, success: bool, message: &str) {
        if self.quiet && success {
            return;
        }
        let rule = "=".repeat(RULE_WIDTH);
        println!("\n{rule}");
        if success {
            println!("{} {}", "[SUCCESS]".green().bold(), message);
        } else {
            println!("{} {}", "[WARNING]".yellow().bold(), message);
        }
        println!("{rule}");
    }

    pub fn verification(&self, report: &VerificationReport) {
        self.step("Verifying integration...");
        for check in &report.checks {
            if check.passed {
                self.ok(format!("{}: {}", check.file, check.description));
            } else {
                self.fail(check.to_string());
            }
        }
    }

    pub fn next_steps(&self, steps: &[String]) {
        if self.quiet {
            return;
        }
        println!("\nNext steps:");
        for (i, step) in steps.iter().enumerate() {
            println!("  {}. {}", i + 1, step);
        }
    }
}
