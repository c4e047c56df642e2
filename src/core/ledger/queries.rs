//! Read-only ledger queries
//!
//! History, per-package summaries and audit checks. None of these take the
//! write lock.

use std::fs;

use rusqlite::params;
use tracing::warn;

use super::{
    parse_timestamp, reservation_from_row, ContiguityViolation, LabelLedger, LedgerStats,
    PackageSummary, Reservation, Result, RESERVATION_COLUMNS,
};

impl LabelLedger {
    /// All reservations for a package, oldest first
    pub fn history(&self, package_id: i64) -> Result<Vec<Reservation>> {
        let sql = format!(
            "SELECT {} FROM carton_reservations WHERE package_id = ?1 ORDER BY id",
            RESERVATION_COLUMNS
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(params![package_id], reservation_from_row)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    /// The newest reservations across all packages, newest first
    pub fn recent(&self, limit: usize) -> Result<Vec<Reservation>> {
        let sql = format!(
            "SELECT {} FROM carton_reservations ORDER BY id DESC LIMIT ?1",
            RESERVATION_COLUMNS
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(
            params![i64::try_from(limit).unwrap_or(i64::MAX)],
            reservation_from_row,
        )?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    /// Every reservation in insertion order
    pub fn reservations(&self) -> Result<Vec<Reservation>> {
        let sql = format!(
            "SELECT {} FROM carton_reservations ORDER BY id",
            RESERVATION_COLUMNS
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map([], reservation_from_row)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    /// Allocation state of every package, ordered by package id
    pub fn packages(&self) -> Result<Vec<PackageSummary>> {
        let mut stmt = self.conn.prepare(
            r#"SELECT l.package_id, l.package_name, agg.cnt, agg.total,
                      l.start_carton + l.qty - 1, l.created_at
               FROM (SELECT package_id, MAX(id) AS last_id, COUNT(*) AS cnt, SUM(qty) AS total
                     FROM carton_reservations
                     GROUP BY package_id) agg
               JOIN carton_reservations l ON l.id = agg.last_id
               ORDER BY l.package_id"#,
        )?;

        let rows = stmt.query_map([], |row| {
            let created_raw: String = row.get(5)?;
            let last_reserved_at = parse_timestamp(&created_raw).ok_or_else(|| {
                rusqlite::Error::FromSqlConversionFailure(
                    5,
                    rusqlite::types::Type::Text,
                    format!("invalid created_at timestamp '{}'", created_raw).into(),
                )
            })?;
            Ok(PackageSummary {
                package_id: row.get(0)?,
                package_name: row.get(1)?,
                reservations: row.get::<_, i64>(2)? as usize,
                labels_issued: row.get(3)?,
                last_issued: row.get(4)?,
                last_reserved_at,
            })
        })?;

        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    /// Ledger-wide counts
    pub fn statistics(&self) -> Result<LedgerStats> {
        let (total_reservations, total_packages, total_labels): (i64, i64, i64) =
            self.conn.query_row(
                "SELECT COUNT(*), COUNT(DISTINCT package_id), COALESCE(SUM(qty), 0)
                 FROM carton_reservations",
                [],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
            )?;

        let db_size_bytes = self
            .path
            .as_ref()
            .and_then(|p| fs::metadata(p).ok())
            .map(|m| m.len())
            .unwrap_or(0);

        Ok(LedgerStats {
            total_reservations: total_reservations as usize,
            total_packages: total_packages as usize,
            total_labels,
            db_size_bytes,
        })
    }

    /// Re-check numbering continuity over the stored rows
    ///
    /// Each package must start at 1 and every following reservation must
    /// begin right after the previous one ends. Returns the rows that break
    /// that rule; an empty vec means the ledger is consistent.
    pub fn verify(&self, package_id: Option<i64>) -> Result<Vec<ContiguityViolation>> {
        let rows: Vec<(i64, i64, i64, i64)> = {
            let base = "SELECT id, package_id, start_carton, qty FROM carton_reservations";
            match package_id {
                Some(id) => {
                    let mut stmt = self
                        .conn
                        .prepare(&format!("{} WHERE package_id = ?1 ORDER BY id", base))?;
                    let rows = stmt.query_map(params![id], numbering_row)?;
                    rows.collect::<rusqlite::Result<Vec<_>>>()?
                }
                None => {
                    let mut stmt = self
                        .conn
                        .prepare(&format!("{} ORDER BY package_id, id", base))?;
                    let rows = stmt.query_map([], numbering_row)?;
                    rows.collect::<rusqlite::Result<Vec<_>>>()?
                }
            }
        };

        let mut violations = Vec::new();
        let mut current: Option<(i64, i64)> = None; // (package_id, next expected start)

        for (id, pkg, start, qty) in rows {
            let expected = match current {
                Some((prev_pkg, next)) if prev_pkg == pkg => next,
                _ => 1,
            };
            if start != expected {
                warn!(
                    package_id = pkg,
                    reservation_id = id,
                    expected_start = expected,
                    actual_start = start,
                    "label numbering is not contiguous"
                );
                violations.push(ContiguityViolation {
                    package_id: pkg,
                    reservation_id: id,
                    expected_start: expected,
                    actual_start: start,
                });
            }
            current = Some((pkg, start.saturating_add(qty)));
        }

        Ok(violations)
    }
}

/// (id, package_id, start_carton, qty)
fn numbering_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<(i64, i64, i64, i64)> {
    Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?))
}
