//! `cartons status` command - Ledger location and statistics

use console::style;
use miette::{IntoDiagnostic, Result};
use serde_json::json;

use crate::cli::helpers::Context;
use crate::cli::{GlobalOpts, OutputFormat};

#[derive(clap::Args, Debug)]
pub struct StatusArgs {}

pub fn run(_args: StatusArgs, global: &GlobalOpts) -> Result<()> {
    let ctx = Context::load();
    let path = ctx.ledger_path(global)?;
    let ledger = ctx.open_existing_ledger(global)?;
    let stats = ledger.statistics()?;

    match ctx.format(global) {
        OutputFormat::Json => {
            let value = json!({
                "ledger": path.display().to_string(),
                "schema_version": ledger.schema_version()?,
                "statistics": stats,
            });
            println!("{}", serde_json::to_string_pretty(&value).into_diagnostic()?);
        }
        _ => {
            println!("{}", style("Ledger Status").bold());
            println!("{}", style("─".repeat(40)).dim());
            println!("  Location:        {}", path.display());
            if let Some(ref ws) = ctx.workspace {
                println!("  Workspace:       {}", ws.root().display());
            }
            println!("  Schema version:  {}", ledger.schema_version()?);
            println!(
                "  Reservations:    {}",
                style(stats.total_reservations).cyan()
            );
            println!("  Packages:        {}", style(stats.total_packages).cyan());
            println!("  Labels issued:   {}", style(stats.total_labels).cyan());
            println!(
                "  Database size:   {} KB",
                style(stats.db_size_bytes / 1024).cyan()
            );
        }
    }

    Ok(())
}
