//! `cartons reserve` command - Allocate the next block of label numbers

use console::style;
use miette::{IntoDiagnostic, Result};
use serde_json::json;

use crate::cli::helpers::Context;
use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::{LabelRange, ReservationRequest};

#[derive(clap::Args, Debug)]
pub struct ReserveArgs {
    /// External package identifier
    #[arg(long)]
    pub package_id: i64,

    /// Package display name printed on the labels
    #[arg(long)]
    pub package_name: String,

    /// Number of labels to reserve
    #[arg(long, allow_negative_numbers = true)]
    pub qty: i64,

    /// Order the labels are printed for
    #[arg(long)]
    pub order: Option<String>,
}

pub fn run(args: ReserveArgs, global: &GlobalOpts) -> Result<()> {
    let ctx = Context::load();

    let mut request = ReservationRequest::new(args.package_id, args.package_name, args.qty);
    request.order_ref = args.order;
    request.user = ctx.user(global);

    let mut ledger = ctx.open_ledger(global)?;
    let range = ledger.reserve(&request)?;

    print!("{}", render(&request, range, ctx.format(global), global.quiet)?);
    Ok(())
}

fn render(
    request: &ReservationRequest,
    range: LabelRange,
    format: OutputFormat,
    quiet: bool,
) -> Result<String> {
    let value = json!({
        "package_id": request.package_id,
        "package_name": request.package_name,
        "start": range.start,
        "qty": range.qty,
        "last": range.last(),
    });

    let out = match format {
        OutputFormat::Json => {
            format!("{}\n", serde_json::to_string_pretty(&value).into_diagnostic()?)
        }
        OutputFormat::Yaml => serde_yml::to_string(&value).into_diagnostic()?,
        OutputFormat::Tsv => format!(
            "{}\t{}\t{}\t{}\n",
            request.package_id,
            range.start,
            range.qty,
            range.last()
        ),
        OutputFormat::Csv => format!(
            "package_id,start,qty,last\n{},{},{},{}\n",
            request.package_id,
            range.start,
            range.qty,
            range.last()
        ),
        OutputFormat::Id => format!("{}\n", range.start),
        OutputFormat::Md | OutputFormat::Auto => {
            if quiet {
                format!("{}-{}\n", range.start, range.last())
            } else {
                format!(
                    "{} Reserved labels {} to {} ({} carton(s)) for {}\n",
                    style("✓").green(),
                    style(range.start).cyan(),
                    style(range.last()).cyan(),
                    range.qty,
                    style(&request.package_name).yellow()
                )
            }
        }
    };

    Ok(out)
}
