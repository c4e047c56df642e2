//! Shared helper functions for CLI commands
//!
//! Ledger opening, config lookups and small formatting utilities used across
//! multiple command modules.

use miette::Result;
use std::path::PathBuf;

use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::{Config, LabelLedger, Workspace};

/// Workspace (if any) and effective configuration for a command
pub struct Context {
    pub workspace: Option<Workspace>,
    pub config: Config,
}

impl Context {
    /// Discover the workspace and load layered config
    pub fn load() -> Self {
        let workspace = Workspace::discover().ok();
        let config = Config::load_for(workspace.as_ref());
        Self { workspace, config }
    }

    /// Ledger path: `--ledger` flag, then config, then workspace default
    pub fn ledger_path(&self, global: &GlobalOpts) -> Result<PathBuf> {
        global
            .ledger
            .clone()
            .or_else(|| self.config.ledger_path(self.workspace.as_ref()))
            .ok_or_else(|| {
                miette::miette!(
                    help = "run `cartons init`, pass --ledger, or set CARTONS_LEDGER",
                    "no ledger configured"
                )
            })
    }

    /// Open the ledger this command writes to, creating it if needed
    pub fn open_ledger(&self, global: &GlobalOpts) -> Result<LabelLedger> {
        let path = self.ledger_path(global)?;
        let ledger = LabelLedger::open(&path, &self.config.ledger_options())?;
        Ok(ledger)
    }

    /// Open a ledger that must already exist (read commands)
    pub fn open_existing_ledger(&self, global: &GlobalOpts) -> Result<LabelLedger> {
        let path = self.ledger_path(global)?;
        let ledger = LabelLedger::open_existing(&path, &self.config.ledger_options())?;
        Ok(ledger)
    }

    /// User recorded on reservations: `--user` flag, then config, then login name
    pub fn user(&self, global: &GlobalOpts) -> Option<String> {
        global.user.clone().or_else(|| self.config.user())
    }

    /// Output format, with `auto` replaced by the configured default
    pub fn format(&self, global: &GlobalOpts) -> OutputFormat {
        if global.format != OutputFormat::Auto {
            return global.format;
        }
        self.config
            .default_format
            .as_deref()
            .and_then(OutputFormat::from_name)
            .unwrap_or(OutputFormat::Auto)
    }
}

/// Truncate a string to max_len, adding "..." if truncated
///
/// Useful for table columns that need fixed-width output.
pub fn truncate_str(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

/// Escape a string for CSV output
///
/// Handles commas, quotes, and newlines according to RFC 4180.
pub fn escape_csv(s: &str) -> String {
    if s.contains(',') || s.contains('"') || s.contains('\n') {
        format!("\"{}\"", s.replace('"', "\"\""))
    } else {
        s.to_string()
    }
}
