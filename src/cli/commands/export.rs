//! `cartons export` command - Dump the ledger as CSV
//!
//! Column names and order match the ledger table so the file can be loaded
//! back by tooling that reads the database directly.

use console::style;
use miette::{IntoDiagnostic, Result};
use std::fs::File;
use std::io::{self, Write};
use std::path::PathBuf;

use crate::cli::helpers::Context;
use crate::cli::GlobalOpts;
use crate::core::Reservation;

/// Export header, identical to the ledger's column names
pub const EXPORT_COLUMNS: [&str; 8] = [
    "id",
    "package_id",
    "package_name",
    "start_carton",
    "qty",
    "orden_name",
    "usuario",
    "created_at",
];

#[derive(clap::Args, Debug)]
pub struct ExportArgs {
    /// Write to this file instead of stdout
    #[arg(long, short = 'o')]
    pub output: Option<PathBuf>,

    /// Only export reservations for this package
    #[arg(long)]
    pub package_id: Option<i64>,
}

pub fn run(args: ExportArgs, global: &GlobalOpts) -> Result<()> {
    let ctx = Context::load();
    let ledger = ctx.open_existing_ledger(global)?;

    let rows = match args.package_id {
        Some(id) => ledger.history(id)?,
        None => ledger.reservations()?,
    };

    match args.output {
        Some(ref path) => {
            let file = File::create(path).into_diagnostic()?;
            write_csv(file, &rows)?;
            if !global.quiet {
                eprintln!(
                    "{} Exported {} reservation(s) to {}",
                    style("✓").green(),
                    rows.len(),
                    style(path.display()).cyan()
                );
            }
        }
        None => write_csv(io::stdout().lock(), &rows)?,
    }

    Ok(())
}

/// Write reservations as CSV with the ledger's column names
pub fn write_csv<W: Write>(writer: W, rows: &[Reservation]) -> Result<()> {
    let mut wtr = csv::Writer::from_writer(writer);
    wtr.write_record(EXPORT_COLUMNS).into_diagnostic()?;

    for r in rows {
        wtr.write_record([
            r.id.to_string(),
            r.package_id.to_string(),
            r.package_name.clone(),
            r.start.to_string(),
            r.qty.to_string(),
            r.order_ref.clone().unwrap_or_default(),
            r.user.clone().unwrap_or_default(),
            r.created_at.to_rfc3339(),
        ])
        .into_diagnostic()?;
    }

    wtr.flush().into_diagnostic()?;
    Ok(())
}
