//! `cartons history` command - Reservations made for one package

use miette::Result;

use crate::cli::helpers::Context;
use crate::cli::table::render;
use crate::cli::GlobalOpts;

#[derive(clap::Args, Debug)]
pub struct HistoryArgs {
    /// External package identifier
    pub package_id: i64,
}

pub fn run(args: HistoryArgs, global: &GlobalOpts) -> Result<()> {
    let ctx = Context::load();
    let ledger = ctx.open_existing_ledger(global)?;
    let history = ledger.history(args.package_id)?;

    let summary = match history.last() {
        Some(latest) => format!(
            "{} reservation(s), last issued label {}",
            history.len(),
            latest.last()
        ),
        None => format!("No reservations for package {}", args.package_id),
    };

    print!("{}", render(&history, ctx.format(global), &summary)?);
    Ok(())
}
