//! `cartons verify` command - Audit numbering continuity

use console::style;
use miette::{IntoDiagnostic, Result};

use crate::cli::helpers::Context;
use crate::cli::{GlobalOpts, OutputFormat};

#[derive(clap::Args, Debug)]
pub struct VerifyArgs {
    /// Only check this package
    #[arg(long)]
    pub package_id: Option<i64>,
}

pub fn run(args: VerifyArgs, global: &GlobalOpts) -> Result<()> {
    let ctx = Context::load();
    let ledger = ctx.open_existing_ledger(global)?;
    let violations = ledger.verify(args.package_id)?;

    match ctx.format(global) {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::to_string_pretty(&violations).into_diagnostic()?
            );
        }
        OutputFormat::Tsv => {
            for v in &violations {
                println!(
                    "{}\t{}\t{}\t{}",
                    v.package_id, v.reservation_id, v.expected_start, v.actual_start
                );
            }
        }
        _ => {
            if violations.is_empty() {
                if !global.quiet {
                    println!("{} Label numbering is contiguous", style("✓").green());
                }
            } else {
                for v in &violations {
                    println!(
                        "{} package {} reservation {}: expected start {}, found {}",
                        style("✗").red(),
                        v.package_id,
                        v.reservation_id,
                        v.expected_start,
                        v.actual_start
                    );
                }
            }
        }
    }

    if violations.is_empty() {
        Ok(())
    } else {
        Err(miette::miette!(
            "{} non-contiguous reservation(s) found",
            violations.len()
        ))
    }
}
