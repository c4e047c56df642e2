//! CLI argument definitions using clap derive

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::cli::commands::{
    completions::CompletionsArgs, config::ConfigCommands, export::ExportArgs,
    history::HistoryArgs, init::InitArgs, labels::LabelsArgs, last::LastArgs,
    packages::PackagesArgs, recent::RecentArgs, reserve::ReserveArgs, status::StatusArgs,
    verify::VerifyArgs,
};

#[derive(Parser)]
#[command(name = "cartons")]
#[command(author, version, about = "Carton label ledger")]
#[command(
    long_about = "Allocate non-overlapping ranges of carton label numbers per shipping package, recorded in an append-only ledger."
)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[command(flatten)]
    pub global: GlobalOpts,
}

#[derive(clap::Args, Clone, Debug)]
pub struct GlobalOpts {
    /// Output format
    #[arg(long, short = 'f', global = true, default_value = "auto")]
    pub format: OutputFormat,

    /// Suppress non-essential output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Enable verbose output (debug logging on stderr)
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,

    /// Ledger database (default: from config, then .cartons/ledger.db)
    #[arg(long, global = true, env = "CARTONS_LEDGER")]
    pub ledger: Option<PathBuf>,

    /// User recorded on reservations (default: from config, then $USER)
    #[arg(long, global = true)]
    pub user: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize a cartons workspace
    Init(InitArgs),

    /// Reserve the next block of label numbers for a package
    Reserve(ReserveArgs),

    /// Show the last label number issued for a package
    Last(LastArgs),

    /// List every reservation made for a package
    History(HistoryArgs),

    /// Summarize allocation state per package
    Packages(PackagesArgs),

    /// Show the most recent reservations across packages
    Recent(RecentArgs),

    /// Print the label numbers of a reservation, one per line
    Labels(LabelsArgs),

    /// Export the full ledger as CSV
    Export(ExportArgs),

    /// Check that stored numbering is contiguous
    Verify(VerifyArgs),

    /// Show ledger location and statistics
    Status(StatusArgs),

    /// View and modify configuration
    #[command(subcommand)]
    Config(ConfigCommands),

    /// Generate shell completion scripts
    Completions(CompletionsArgs),
}

#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// Automatically detect based on context (table for lists, text for single values)
    #[default]
    Auto,
    /// YAML format
    Yaml,
    /// Tab-separated values (for piping)
    Tsv,
    /// JSON format (for programming)
    Json,
    /// CSV format (for spreadsheets)
    Csv,
    /// Markdown tables
    Md,
    /// Just identifiers / numbers, one per line
    Id,
}

impl OutputFormat {
    /// Parse a format name as written in config files
    pub fn from_name(name: &str) -> Option<Self> {
        <Self as ValueEnum>::from_str(name, true).ok()
    }
}
