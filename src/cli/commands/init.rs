//! `cartons init` command - Initialize a new workspace

use console::style;
use miette::{IntoDiagnostic, Result};

use crate::core::workspace::{Workspace, WorkspaceError};
use crate::core::{Config, LabelLedger};

#[derive(clap::Args, Debug)]
pub struct InitArgs {
    /// Directory to initialize (default: current directory)
    #[arg(default_value = ".")]
    pub path: std::path::PathBuf,

    /// Rewrite the workspace config even if .cartons/ already exists
    #[arg(long)]
    pub force: bool,
}

pub fn run(args: InitArgs) -> Result<()> {
    let path = if args.path.as_os_str() == "." {
        std::env::current_dir().into_diagnostic()?
    } else {
        args.path.clone()
    };

    // Create directory if it doesn't exist
    if !path.exists() {
        std::fs::create_dir_all(&path).into_diagnostic()?;
        println!(
            "{} Created directory {}",
            style("✓").green(),
            style(path.display()).cyan()
        );
    }

    let workspace = if args.force {
        Workspace::init_force(&path)
    } else {
        Workspace::init(&path)
    };

    match workspace {
        Ok(workspace) => {
            // Create the ledger up front so permission problems surface now
            let config = Config::load_for(Some(&workspace));
            let ledger_path = workspace.default_ledger_path();
            LabelLedger::open(&ledger_path, &config.ledger_options())?;

            println!(
                "{} Initialized cartons workspace at {}",
                style("✓").green(),
                style(workspace.root().display()).cyan()
            );
            println!("  Ledger: {}", ledger_path.display());
            println!("  Config: {}", workspace.config_path().display());
            println!();
            println!("Next steps:");
            println!(
                "  {} Reserve labels for a package",
                style("cartons reserve --package-id 42 --package-name PACK0042 --qty 5").yellow()
            );
            println!(
                "  {} Show allocation per package",
                style("cartons packages").yellow()
            );
            Ok(())
        }
        Err(WorkspaceError::AlreadyExists(path)) => {
            println!(
                "{} cartons workspace already exists at {}",
                style("!").yellow(),
                style(path.display()).cyan()
            );
            println!();
            println!(
                "Use {} to rewrite the workspace config",
                style("cartons init --force").yellow()
            );
            Ok(())
        }
        Err(e) => Err(miette::miette!("{}", e)),
    }
}
