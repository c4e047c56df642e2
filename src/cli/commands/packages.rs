//! `cartons packages` command - Allocation state per package

use miette::Result;

use crate::cli::helpers::Context;
use crate::cli::table::render;
use crate::cli::GlobalOpts;

#[derive(clap::Args, Debug)]
pub struct PackagesArgs {
    /// Only show packages whose name contains this text (case-insensitive)
    #[arg(long)]
    pub name: Option<String>,
}

pub fn run(args: PackagesArgs, global: &GlobalOpts) -> Result<()> {
    let ctx = Context::load();
    let ledger = ctx.open_existing_ledger(global)?;

    let mut packages = ledger.packages()?;
    if let Some(ref needle) = args.name {
        let needle = needle.to_lowercase();
        packages.retain(|p| p.package_name.to_lowercase().contains(&needle));
    }

    let summary = format!("{} package(s)", packages.len());
    print!("{}", render(&packages, ctx.format(global), &summary)?);
    Ok(())
}
