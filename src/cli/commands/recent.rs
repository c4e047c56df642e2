//! `cartons recent` command - Latest reservations across packages

use miette::Result;

use crate::cli::helpers::Context;
use crate::cli::table::render;
use crate::cli::GlobalOpts;

#[derive(clap::Args, Debug)]
pub struct RecentArgs {
    /// Number of reservations to show
    #[arg(long, short = 'n', default_value_t = 20)]
    pub limit: usize,
}

pub fn run(args: RecentArgs, global: &GlobalOpts) -> Result<()> {
    let ctx = Context::load();
    let ledger = ctx.open_existing_ledger(global)?;
    let recent = ledger.recent(args.limit)?;

    let summary = format!("{} reservation(s)", recent.len());
    print!("{}", render(&recent, ctx.format(global), &summary)?);
    Ok(())
}
