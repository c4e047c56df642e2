//! `cartons last` command - Last label number issued for a package

use miette::Result;

use crate::cli::helpers::Context;
use crate::cli::{GlobalOpts, OutputFormat};

#[derive(clap::Args, Debug)]
pub struct LastArgs {
    /// External package identifier
    pub package_id: i64,
}

pub fn run(args: LastArgs, global: &GlobalOpts) -> Result<()> {
    let ctx = Context::load();
    let ledger = ctx.open_existing_ledger(global)?;
    let last = ledger.last_issued(args.package_id)?;

    match ctx.format(global) {
        OutputFormat::Json => println!(
            "{}",
            serde_json::json!({ "package_id": args.package_id, "last_issued": last })
        ),
        _ => println!("{}", last),
    }
    Ok(())
}
