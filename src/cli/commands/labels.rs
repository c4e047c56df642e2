//! `cartons labels` command - Expand a reservation into label lines
//!
//! Prints one line per carton so the output can be piped straight into a
//! label printer job. The template supports these placeholders:
//!
//! - `{n}` the label number
//! - `{last}` the last number of the reservation
//! - `{package}` the package name
//! - `{order}` the order reference (empty if none)

use miette::Result;

use crate::cli::helpers::Context;
use crate::cli::GlobalOpts;
use crate::core::Reservation;

#[derive(clap::Args, Debug)]
pub struct LabelsArgs {
    /// External package identifier
    pub package_id: i64,

    /// Ledger id of the reservation (default: the latest for the package)
    #[arg(long)]
    pub reservation: Option<i64>,

    /// Line template
    #[arg(long, short = 't', default_value = "{n}")]
    pub template: String,
}

pub fn run(args: LabelsArgs, global: &GlobalOpts) -> Result<()> {
    let ctx = Context::load();
    let ledger = ctx.open_existing_ledger(global)?;

    let reservation = match args.reservation {
        Some(id) => ledger
            .reservation(id)?
            .filter(|r| r.package_id == args.package_id)
            .ok_or_else(|| {
                miette::miette!(
                    "reservation {} not found for package {}",
                    id,
                    args.package_id
                )
            })?,
        None => ledger.latest(args.package_id)?.ok_or_else(|| {
            miette::miette!("no reservations for package {}", args.package_id)
        })?,
    };

    for line in render_labels(&reservation, &args.template) {
        println!("{}", line);
    }
    Ok(())
}

/// Expand a reservation into one rendered line per label number
pub fn render_labels(reservation: &Reservation, template: &str) -> Vec<String> {
    let last = reservation.last().to_string();
    let order = reservation.order_ref.as_deref().unwrap_or("");
    let base = template
        .replace("{last}", &last)
        .replace("{package}", &reservation.package_name)
        .replace("{order}", order);

    reservation
        .range()
        .numbers()
        .map(|n| base.replace("{n}", &n.to_string()))
        .collect()
}
