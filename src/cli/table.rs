//! Table formatting utilities for CLI list commands
//!
//! Reservations and package summaries are rendered through one code path per
//! output format so `history`, `recent` and `packages` stay consistent.

use miette::{IntoDiagnostic, Result};
use serde::Serialize;
use tabled::{builder::Builder, settings::Style};

use crate::cli::helpers::{escape_csv, truncate_str};
use crate::cli::OutputFormat;
use crate::core::{PackageSummary, Reservation};

/// A list that can be printed as a table
pub trait Tabular: Serialize {
    /// Column headers
    fn headers() -> &'static [&'static str];

    /// Cell values in header order
    fn cells(&self) -> Vec<String>;

    /// Value printed by `--format id`
    fn id_cell(&self) -> String;
}

impl Tabular for Reservation {
    fn headers() -> &'static [&'static str] {
        &[
            "ID", "PACKAGE", "NAME", "START", "QTY", "LAST", "ORDER", "USER", "CREATED",
        ]
    }

    fn cells(&self) -> Vec<String> {
        vec![
            self.id.to_string(),
            self.package_id.to_string(),
            self.package_name.clone(),
            self.start.to_string(),
            self.qty.to_string(),
            self.last().to_string(),
            self.order_ref.clone().unwrap_or_default(),
            self.user.clone().unwrap_or_default(),
            self.created_at.to_rfc3339(),
        ]
    }

    fn id_cell(&self) -> String {
        self.id.to_string()
    }
}

impl Tabular for PackageSummary {
    fn headers() -> &'static [&'static str] {
        &["PACKAGE", "NAME", "RESERVATIONS", "LABELS", "LAST", "LAST RESERVED"]
    }

    fn cells(&self) -> Vec<String> {
        vec![
            self.package_id.to_string(),
            self.package_name.clone(),
            self.reservations.to_string(),
            self.labels_issued.to_string(),
            self.last_issued.to_string(),
            self.last_reserved_at.to_rfc3339(),
        ]
    }

    fn id_cell(&self) -> String {
        self.package_id.to_string()
    }
}

/// Render rows in the requested format
///
/// `summary` is appended to human-readable tables only, never to formats
/// meant for piping.
pub fn render<T: Tabular>(rows: &[T], format: OutputFormat, summary: &str) -> Result<String> {
    let mut out = String::new();

    match format {
        OutputFormat::Json => {
            out.push_str(&serde_json::to_string_pretty(rows).into_diagnostic()?);
            out.push('\n');
        }
        OutputFormat::Yaml => {
            out.push_str(&serde_yml::to_string(rows).into_diagnostic()?);
        }
        OutputFormat::Tsv => {
            out.push_str(&T::headers().join("\t"));
            out.push('\n');
            for row in rows {
                out.push_str(&row.cells().join("\t"));
                out.push('\n');
            }
        }
        OutputFormat::Csv => {
            out.push_str(&T::headers().join(","));
            out.push('\n');
            for row in rows {
                let cells: Vec<String> = row.cells().iter().map(|c| escape_csv(c)).collect();
                out.push_str(&cells.join(","));
                out.push('\n');
            }
        }
        OutputFormat::Id => {
            for row in rows {
                out.push_str(&row.id_cell());
                out.push('\n');
            }
        }
        OutputFormat::Md | OutputFormat::Auto => {
            let mut builder = Builder::default();
            builder.push_record(T::headers().iter().copied());
            for row in rows {
                builder.push_record(row.cells().iter().map(|c| truncate_str(c, 32)));
            }

            let mut table = builder.build();
            if format == OutputFormat::Md {
                table.with(Style::markdown());
            } else {
                table.with(Style::rounded());
            }
            out.push_str(&table.to_string());
            out.push('\n');

            if !summary.is_empty() {
                out.push('\n');
                out.push_str(summary);
                out.push('\n');
            }
        }
    }

    Ok(out)
}
