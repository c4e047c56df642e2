//! Database schema initialization

use rusqlite::{params, OptionalExtension, TransactionBehavior};
use tracing::debug;

use super::{LabelLedger, LedgerError, Result, SCHEMA_VERSION};

impl LabelLedger {
    /// Create missing tables and record the schema version
    ///
    /// The ledger is an audit trail, so an older file is upgraded in place and
    /// never dropped. A file written by a newer build is refused.
    ///
    /// A file already at the current version is only read, so opening a
    /// ledger never waits on a writer holding the lock.
    pub(super) fn init_schema(&mut self) -> Result<()> {
        if let Some(version) = self.recorded_version()? {
            check_supported(version)?;
            if version == SCHEMA_VERSION {
                return Ok(());
            }
        }

        // Another process may have created or upgraded the file since the
        // check above, so the version is read again under the lock
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;

        tx.execute_batch(
            r#"
            -- Schema version tracking
            CREATE TABLE IF NOT EXISTS schema_version (
                version INTEGER PRIMARY KEY
            );

            -- Append-only reservation history
            CREATE TABLE IF NOT EXISTS carton_reservations (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                package_id INTEGER NOT NULL,
                package_name TEXT NOT NULL,
                start_carton INTEGER NOT NULL,
                qty INTEGER NOT NULL,
                orden_name TEXT,
                usuario TEXT,
                created_at TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_reservations_package
                ON carton_reservations(package_id, id);
            "#,
        )?;

        let found: Option<i64> = tx
            .query_row("SELECT MAX(version) FROM schema_version", [], |row| {
                row.get(0)
            })
            .optional()?
            .flatten();

        if let Some(version) = found {
            check_supported(version)?;
        }

        match found {
            Some(version) if version == SCHEMA_VERSION => {}
            _ => {
                tx.execute("DELETE FROM schema_version", [])?;
                tx.execute(
                    "INSERT INTO schema_version (version) VALUES (?1)",
                    params![SCHEMA_VERSION],
                )?;
                debug!(from = ?found, to = SCHEMA_VERSION, "initialized ledger schema");
            }
        }

        tx.commit()?;
        Ok(())
    }

    /// Version in the file, `None` while the ledger tables are missing
    fn recorded_version(&self) -> Result<Option<i64>> {
        let tables: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM sqlite_master
             WHERE type = 'table' AND name IN ('schema_version', 'carton_reservations')",
            [],
            |row| row.get(0),
        )?;
        if tables < 2 {
            return Ok(None);
        }
        self.schema_version().map(|v| (v > 0).then_some(v))
    }

    /// Schema version recorded in the ledger file
    pub fn schema_version(&self) -> Result<i64> {
        let version: Option<i64> = self
            .conn
            .query_row("SELECT MAX(version) FROM schema_version", [], |row| {
                row.get(0)
            })?;
        Ok(version.unwrap_or(0))
    }
}

fn check_supported(version: i64) -> Result<()> {
    if version > SCHEMA_VERSION {
        return Err(LedgerError::SchemaVersion {
            found: version,
            supported: SCHEMA_VERSION,
        });
    }
    Ok(())
}
