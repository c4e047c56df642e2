//! SQLite-backed carton label ledger
//!
//! This module hands out contiguous, non-overlapping ranges of label numbers
//! per shipping package:
//! - Every reservation is an appended row; rows are never updated or deleted
//! - The next start is derived from the package's latest row, not a counter
//! - Read, compute and insert happen inside one IMMEDIATE transaction
//!
//! The write lock covers the whole ledger file. Label printing is low volume,
//! so writers for unrelated packages simply queue behind each other for the
//! length of one short transaction.

mod queries;
mod schema;
mod types;

pub use types::*;

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, NaiveDateTime, SecondsFormat, Utc};
use miette::Diagnostic;
use rusqlite::{params, Connection, OpenFlags, OptionalExtension, Row, TransactionBehavior};
use thiserror::Error;
use tracing::{debug, info};

/// Ledger schema version understood by this build
const SCHEMA_VERSION: i64 = 1;

/// Column list shared by every query that materializes a [`Reservation`]
const RESERVATION_COLUMNS: &str =
    "id, package_id, package_name, start_carton, qty, orden_name, usuario, created_at";

/// Errors raised by the label ledger
#[derive(Debug, Error, Diagnostic)]
pub enum LedgerError {
    #[error("invalid argument: {0}")]
    #[diagnostic(code(cartons::ledger::invalid_argument))]
    InvalidArgument(String),

    #[error("ledger storage error: {0}")]
    #[diagnostic(
        code(cartons::ledger::storage),
        help("the reservation was rolled back; retry the request")
    )]
    Storage(#[from] rusqlite::Error),

    #[error("ledger I/O error: {0}")]
    #[diagnostic(code(cartons::ledger::io))]
    Io(#[from] std::io::Error),

    #[error("ledger schema version {found} is newer than supported version {supported}")]
    #[diagnostic(
        code(cartons::ledger::schema_version),
        help("upgrade cartons before writing to this ledger")
    )]
    SchemaVersion { found: i64, supported: i64 },

    #[error("ledger not found: {}", path.display())]
    #[diagnostic(
        code(cartons::ledger::not_found),
        help("check the ledger path, or run `cartons init` to create one")
    )]
    NotFound { path: PathBuf },
}

pub type Result<T> = std::result::Result<T, LedgerError>;

/// The label ledger backed by SQLite
pub struct LabelLedger {
    conn: Connection,
    path: Option<PathBuf>,
}

impl LabelLedger {
    /// Open or create a ledger file
    ///
    /// Missing parent directories and tables are created. Each handle owns its
    /// own connection; concurrent writers must each open their own handle.
    pub fn open(path: &Path, options: &LedgerOptions) -> Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open(path)?;
        Self::configure(conn, path, options)
    }

    /// Open a ledger file that must already exist
    ///
    /// Used by read paths so a mistyped path is reported instead of being
    /// created as an empty ledger.
    pub fn open_existing(path: &Path, options: &LedgerOptions) -> Result<Self> {
        if !path.is_file() {
            return Err(LedgerError::NotFound {
                path: path.to_path_buf(),
            });
        }

        let flags = OpenFlags::SQLITE_OPEN_READ_WRITE
            | OpenFlags::SQLITE_OPEN_URI
            | OpenFlags::SQLITE_OPEN_NO_MUTEX;
        let conn = Connection::open_with_flags(path, flags)?;
        Self::configure(conn, path, options)
    }

    fn configure(conn: Connection, path: &Path, options: &LedgerOptions) -> Result<Self> {
        conn.busy_timeout(options.busy_timeout)?;

        // WAL lets readers proceed while a reservation holds the write lock.
        // Switching modes needs exclusive access, so only do it once per file.
        let mode: String = conn.query_row("PRAGMA journal_mode", [], |row| row.get(0))?;
        if !mode.eq_ignore_ascii_case("wal") {
            conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        }

        let mut ledger = Self {
            conn,
            path: Some(path.to_path_buf()),
        };
        ledger.init_schema()?;

        debug!(path = %path.display(), "opened label ledger");
        Ok(ledger)
    }

    /// Open a private in-memory ledger
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let mut ledger = Self { conn, path: None };
        ledger.init_schema()?;
        Ok(ledger)
    }

    /// Path of the backing file, `None` for in-memory ledgers
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Reserve the next `qty` label numbers for a package
    ///
    /// The write lock is taken before the latest row is read and held until
    /// the new row is committed, so two callers can never compute the same
    /// start. On any storage failure the transaction is rolled back and no
    /// row is written.
    pub fn reserve(&mut self, request: &ReservationRequest) -> Result<LabelRange> {
        validate_request(request)?;

        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;

        let previous: Option<(i64, i64)> = tx
            .query_row(
                "SELECT start_carton, qty FROM carton_reservations
                 WHERE package_id = ?1 ORDER BY id DESC LIMIT 1",
                params![request.package_id],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()?;

        let start = match previous {
            Some((prev_start, prev_qty)) => prev_start.checked_add(prev_qty).ok_or_else(|| {
                LedgerError::InvalidArgument(format!(
                    "label numbering for package {} is exhausted",
                    request.package_id
                ))
            })?,
            None => 1,
        };
        if start.checked_add(request.qty).is_none() {
            return Err(LedgerError::InvalidArgument(format!(
                "qty {} would overflow label numbering for package {}",
                request.qty, request.package_id
            )));
        }

        tx.execute(
            "INSERT INTO carton_reservations
                (package_id, package_name, start_carton, qty, orden_name, usuario, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                request.package_id,
                request.package_name,
                start,
                request.qty,
                request.order_ref,
                request.user,
                format_timestamp(Utc::now()),
            ],
        )?;
        tx.commit()?;

        let range = LabelRange {
            start,
            qty: request.qty,
        };
        info!(
            package_id = request.package_id,
            start = range.start,
            last = range.last(),
            "reserved carton labels"
        );
        Ok(range)
    }

    /// Last label number issued for a package, or 0 if none has been
    pub fn last_issued(&self, package_id: i64) -> Result<i64> {
        let last: Option<i64> = self
            .conn
            .query_row(
                "SELECT start_carton + qty - 1 FROM carton_reservations
                 WHERE package_id = ?1 ORDER BY id DESC LIMIT 1",
                params![package_id],
                |row| row.get(0),
            )
            .optional()?;

        Ok(last.unwrap_or(0))
    }

    /// Most recent reservation for a package
    pub fn latest(&self, package_id: i64) -> Result<Option<Reservation>> {
        let sql = format!(
            "SELECT {} FROM carton_reservations WHERE package_id = ?1 ORDER BY id DESC LIMIT 1",
            RESERVATION_COLUMNS
        );
        let reservation = self
            .conn
            .query_row(&sql, params![package_id], reservation_from_row)
            .optional()?;
        Ok(reservation)
    }

    /// Look up a reservation by its ledger id
    pub fn reservation(&self, id: i64) -> Result<Option<Reservation>> {
        let sql = format!(
            "SELECT {} FROM carton_reservations WHERE id = ?1",
            RESERVATION_COLUMNS
        );
        let reservation = self
            .conn
            .query_row(&sql, params![id], reservation_from_row)
            .optional()?;
        Ok(reservation)
    }
}

/// Reject requests that must not touch storage at all
fn validate_request(request: &ReservationRequest) -> Result<()> {
    if request.qty <= 0 {
        return Err(LedgerError::InvalidArgument(format!(
            "qty must be a positive integer, got {}",
            request.qty
        )));
    }
    if request.package_name.trim().is_empty() {
        return Err(LedgerError::InvalidArgument(
            "package name must not be empty".to_string(),
        ));
    }
    Ok(())
}

/// Map a row selected with [`RESERVATION_COLUMNS`]
fn reservation_from_row(row: &Row<'_>) -> rusqlite::Result<Reservation> {
    let created_raw: String = row.get(7)?;
    let created_at = parse_timestamp(&created_raw).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            7,
            rusqlite::types::Type::Text,
            format!("invalid created_at timestamp '{}'", created_raw).into(),
        )
    })?;

    Ok(Reservation {
        id: row.get(0)?,
        package_id: row.get(1)?,
        package_name: row.get(2)?,
        start: row.get(3)?,
        qty: row.get(4)?,
        order_ref: row.get(5)?,
        user: row.get(6)?,
        created_at,
    })
}

/// Timestamp format stored in `created_at`
fn format_timestamp(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Parse a stored timestamp
///
/// Accepts RFC 3339 as written by this crate, and naive ISO-8601 values
/// (assumed UTC) as found in ledgers written by earlier tooling.
fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
        .map(|naive| naive.and_utc())
}

#[cfg(test)]
mod tests;
