use std::collections::HashSet;
use std::sync::{Arc, Barrier};
use std::thread;

use rusqlite::params;
use tempfile::tempdir;

use super::*;

fn pack42(qty: i64) -> ReservationRequest {
    ReservationRequest::new(42, "PACK0042", qty)
}

fn row_count(ledger: &LabelLedger) -> i64 {
    ledger
        .conn
        .query_row("SELECT COUNT(*) FROM carton_reservations", [], |row| {
            row.get(0)
        })
        .unwrap()
}

#[test]
fn test_first_reservation_starts_at_one() {
    let mut ledger = LabelLedger::open_in_memory().unwrap();
    let range = ledger.reserve(&pack42(5)).unwrap();
    assert_eq!(range, LabelRange { start: 1, qty: 5 });
}

#[test]
fn test_example_scenario() {
    let mut ledger = LabelLedger::open_in_memory().unwrap();
    assert_eq!(ledger.last_issued(42).unwrap(), 0);

    let first = ledger.reserve(&pack42(5)).unwrap();
    let second = ledger.reserve(&pack42(3)).unwrap();

    assert_eq!(first, LabelRange { start: 1, qty: 5 });
    assert_eq!(second, LabelRange { start: 6, qty: 3 });
    assert_eq!(ledger.last_issued(42).unwrap(), 8);
}

#[test]
fn test_reservations_are_contiguous() {
    let mut ledger = LabelLedger::open_in_memory().unwrap();
    let quantities = [4, 1, 12, 7, 2];
    let ranges: Vec<LabelRange> = quantities
        .iter()
        .map(|&qty| ledger.reserve(&pack42(qty)).unwrap())
        .collect();

    for pair in ranges.windows(2) {
        assert_eq!(pair[1].start, pair[0].start + pair[0].qty);
    }
    assert_eq!(ledger.last_issued(42).unwrap(), quantities.iter().sum::<i64>());
}

#[test]
fn test_packages_are_numbered_independently() {
    let mut ledger = LabelLedger::open_in_memory().unwrap();
    ledger.reserve(&pack42(10)).unwrap();
    let other = ledger
        .reserve(&ReservationRequest::new(7, "PACK0007", 2))
        .unwrap();
    let back = ledger.reserve(&pack42(1)).unwrap();

    assert_eq!(other.start, 1);
    assert_eq!(back.start, 11);
    assert_eq!(ledger.last_issued(7).unwrap(), 2);
}

#[test]
fn test_zero_qty_rejected_without_insert() {
    let mut ledger = LabelLedger::open_in_memory().unwrap();
    let err = ledger.reserve(&pack42(0)).unwrap_err();
    assert!(matches!(err, LedgerError::InvalidArgument(_)));
    assert_eq!(row_count(&ledger), 0);
}

#[test]
fn test_negative_qty_rejected_without_insert() {
    let mut ledger = LabelLedger::open_in_memory().unwrap();
    ledger.reserve(&pack42(2)).unwrap();
    let err = ledger.reserve(&pack42(-3)).unwrap_err();
    assert!(matches!(err, LedgerError::InvalidArgument(_)));
    assert_eq!(row_count(&ledger), 1);
    assert_eq!(ledger.last_issued(42).unwrap(), 2);
}

#[test]
fn test_blank_package_name_rejected() {
    let mut ledger = LabelLedger::open_in_memory().unwrap();
    let err = ledger
        .reserve(&ReservationRequest::new(42, "   ", 1))
        .unwrap_err();
    assert!(matches!(err, LedgerError::InvalidArgument(_)));
    assert_eq!(row_count(&ledger), 0);
}

#[test]
fn test_overflowing_qty_rejected() {
    let mut ledger = LabelLedger::open_in_memory().unwrap();
    ledger.reserve(&pack42(5)).unwrap();
    let err = ledger.reserve(&pack42(i64::MAX)).unwrap_err();
    assert!(matches!(err, LedgerError::InvalidArgument(_)));
    assert_eq!(row_count(&ledger), 1);
}

#[test]
fn test_reservation_records_order_and_user() {
    let mut ledger = LabelLedger::open_in_memory().unwrap();
    ledger
        .reserve(&pack42(3).with_order("WH/OUT/00017").with_user("maria"))
        .unwrap();

    let latest = ledger.latest(42).unwrap().unwrap();
    assert_eq!(latest.package_name, "PACK0042");
    assert_eq!(latest.order_ref.as_deref(), Some("WH/OUT/00017"));
    assert_eq!(latest.user.as_deref(), Some("maria"));
    assert_eq!(latest.last(), 3);
    assert_eq!(ledger.reservation(latest.id).unwrap(), Some(latest));
}

#[test]
fn test_latest_is_none_for_unknown_package() {
    let ledger = LabelLedger::open_in_memory().unwrap();
    assert!(ledger.latest(99).unwrap().is_none());
    assert!(ledger.history(99).unwrap().is_empty());
}

#[test]
fn test_history_in_insertion_order() {
    let mut ledger = LabelLedger::open_in_memory().unwrap();
    ledger.reserve(&pack42(2)).unwrap();
    ledger
        .reserve(&ReservationRequest::new(7, "PACK0007", 1))
        .unwrap();
    ledger.reserve(&pack42(4)).unwrap();

    let history = ledger.history(42).unwrap();
    let starts: Vec<i64> = history.iter().map(|r| r.start).collect();
    assert_eq!(starts, vec![1, 3]);
}

#[test]
fn test_recent_newest_first() {
    let mut ledger = LabelLedger::open_in_memory().unwrap();
    ledger.reserve(&pack42(1)).unwrap();
    ledger
        .reserve(&ReservationRequest::new(7, "PACK0007", 1))
        .unwrap();
    ledger
        .reserve(&ReservationRequest::new(9, "PACK0009", 1))
        .unwrap();

    let recent = ledger.recent(2).unwrap();
    let ids: Vec<i64> = recent.iter().map(|r| r.package_id).collect();
    assert_eq!(ids, vec![9, 7]);
}

#[test]
fn test_recent_with_huge_limit_returns_everything() {
    let mut ledger = LabelLedger::open_in_memory().unwrap();
    ledger.reserve(&pack42(1)).unwrap();
    ledger.reserve(&pack42(2)).unwrap();

    assert_eq!(ledger.recent(usize::MAX).unwrap().len(), 2);
    assert!(ledger.recent(0).unwrap().is_empty());
}

#[test]
fn test_package_summaries_use_latest_name() {
    let mut ledger = LabelLedger::open_in_memory().unwrap();
    ledger.reserve(&pack42(5)).unwrap();
    ledger
        .reserve(&ReservationRequest::new(42, "PACK0042-B", 3))
        .unwrap();
    ledger
        .reserve(&ReservationRequest::new(7, "PACK0007", 2))
        .unwrap();

    let packages = ledger.packages().unwrap();
    assert_eq!(packages.len(), 2);

    assert_eq!(packages[0].package_id, 7);
    assert_eq!(packages[0].last_issued, 2);

    assert_eq!(packages[1].package_id, 42);
    assert_eq!(packages[1].package_name, "PACK0042-B");
    assert_eq!(packages[1].reservations, 2);
    assert_eq!(packages[1].labels_issued, 8);
    assert_eq!(packages[1].last_issued, 8);
}

#[test]
fn test_statistics() {
    let mut ledger = LabelLedger::open_in_memory().unwrap();
    assert_eq!(ledger.statistics().unwrap(), LedgerStats::default());

    ledger.reserve(&pack42(5)).unwrap();
    ledger.reserve(&pack42(3)).unwrap();
    ledger
        .reserve(&ReservationRequest::new(7, "PACK0007", 2))
        .unwrap();

    let stats = ledger.statistics().unwrap();
    assert_eq!(stats.total_reservations, 3);
    assert_eq!(stats.total_packages, 2);
    assert_eq!(stats.total_labels, 10);
    assert_eq!(stats.db_size_bytes, 0);
}

#[test]
fn test_verify_clean_ledger() {
    let mut ledger = LabelLedger::open_in_memory().unwrap();
    for qty in [3, 1, 6] {
        ledger.reserve(&pack42(qty)).unwrap();
    }
    ledger
        .reserve(&ReservationRequest::new(7, "PACK0007", 2))
        .unwrap();

    assert!(ledger.verify(None).unwrap().is_empty());
    assert!(ledger.verify(Some(42)).unwrap().is_empty());
}

#[test]
fn test_verify_reports_overlap() {
    let mut ledger = LabelLedger::open_in_memory().unwrap();
    ledger.reserve(&pack42(5)).unwrap();

    // Row written by hand, overlapping the first reservation
    ledger
        .conn
        .execute(
            "INSERT INTO carton_reservations
                (package_id, package_name, start_carton, qty, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![42, "PACK0042", 4, 2, "2024-05-01T10:00:00.123456"],
        )
        .unwrap();

    let violations = ledger.verify(None).unwrap();
    assert_eq!(violations.len(), 1);
    assert_eq!(violations[0].package_id, 42);
    assert_eq!(violations[0].expected_start, 6);
    assert_eq!(violations[0].actual_start, 4);

    // Allocation continues from the latest row regardless
    let next = ledger.reserve(&pack42(1)).unwrap();
    assert_eq!(next.start, 6);
}

#[test]
fn test_naive_timestamps_are_read_as_utc() {
    let parsed = parse_timestamp("2024-05-01T10:00:00.123456").unwrap();
    assert_eq!(parsed.to_rfc3339(), "2024-05-01T10:00:00.123456+00:00");
    assert!(parse_timestamp("2024-05-01 10:00:00").is_some());
    assert!(parse_timestamp("yesterday").is_none());
}

#[test]
fn test_stored_timestamp_is_utc_rfc3339() {
    let mut ledger = LabelLedger::open_in_memory().unwrap();
    ledger.reserve(&pack42(1)).unwrap();
    let raw: String = ledger
        .conn
        .query_row("SELECT created_at FROM carton_reservations", [], |row| {
            row.get(0)
        })
        .unwrap();
    assert!(raw.ends_with('Z'));
    assert!(DateTime::parse_from_rfc3339(&raw).is_ok());
}

#[test]
fn test_reopen_preserves_numbering() {
    let tmp = tempdir().unwrap();
    let path = tmp.path().join("nested").join("ledger.db");

    {
        let mut ledger = LabelLedger::open(&path, &LedgerOptions::default()).unwrap();
        ledger.reserve(&pack42(5)).unwrap();
    }

    let mut ledger = LabelLedger::open(&path, &LedgerOptions::default()).unwrap();
    assert_eq!(ledger.last_issued(42).unwrap(), 5);
    assert_eq!(ledger.reserve(&pack42(3)).unwrap().start, 6);
    assert_eq!(ledger.path(), Some(path.as_path()));
    assert!(ledger.statistics().unwrap().db_size_bytes > 0);
}

#[test]
fn test_newer_schema_version_rejected() {
    let tmp = tempdir().unwrap();
    let path = tmp.path().join("ledger.db");

    {
        let ledger = LabelLedger::open(&path, &LedgerOptions::default()).unwrap();
        assert_eq!(ledger.schema_version().unwrap(), SCHEMA_VERSION);
        ledger
            .conn
            .execute(
                "UPDATE schema_version SET version = ?1",
                params![SCHEMA_VERSION + 1],
            )
            .unwrap();
    }

    match LabelLedger::open(&path, &LedgerOptions::default()) {
        Err(LedgerError::SchemaVersion { found, supported }) => {
            assert_eq!(found, SCHEMA_VERSION + 1);
            assert_eq!(supported, SCHEMA_VERSION);
        }
        Err(other) => panic!("unexpected error: {}", other),
        Ok(_) => panic!("newer schema should be rejected"),
    }
}

#[test]
fn test_legacy_ledger_without_version_is_adopted() {
    let tmp = tempdir().unwrap();
    let path = tmp.path().join("ledger.db");

    {
        let conn = Connection::open(&path).unwrap();
        conn.execute_batch(
            r#"
            CREATE TABLE carton_reservations (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                package_id INTEGER NOT NULL,
                package_name TEXT NOT NULL,
                start_carton INTEGER NOT NULL,
                qty INTEGER NOT NULL,
                orden_name TEXT,
                usuario TEXT,
                created_at TEXT NOT NULL
            );
            INSERT INTO carton_reservations
                (package_id, package_name, start_carton, qty, orden_name, usuario, created_at)
            VALUES (42, 'PACK0042', 1, 10, 'WH/OUT/00001', NULL, '2024-05-01T10:00:00.123456');
            "#,
        )
        .unwrap();
    }

    let mut ledger = LabelLedger::open(&path, &LedgerOptions::default()).unwrap();
    assert_eq!(ledger.schema_version().unwrap(), SCHEMA_VERSION);
    assert_eq!(ledger.last_issued(42).unwrap(), 10);
    assert_eq!(ledger.reserve(&pack42(2)).unwrap().start, 11);
}

#[test]
fn test_concurrent_reservations_never_overlap() {
    const WORKERS: usize = 16;

    let tmp = tempdir().unwrap();
    let path = Arc::new(tmp.path().join("ledger.db"));

    // Create the schema up front so workers only race on reservations
    LabelLedger::open(&path, &LedgerOptions::default()).unwrap();

    let barrier = Arc::new(Barrier::new(WORKERS));
    let handles: Vec<_> = (0..WORKERS)
        .map(|_| {
            let path = Arc::clone(&path);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                let options = LedgerOptions::with_busy_timeout_ms(30_000);
                let mut ledger = LabelLedger::open(&path, &options).unwrap();
                barrier.wait();
                ledger.reserve(&pack42(1)).unwrap().start
            })
        })
        .collect();

    let mut starts: Vec<i64> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    starts.sort_unstable();

    let unique: HashSet<i64> = starts.iter().copied().collect();
    assert_eq!(unique.len(), WORKERS);
    assert_eq!(starts, (1..=WORKERS as i64).collect::<Vec<_>>());

    let ledger = LabelLedger::open(&path, &LedgerOptions::default()).unwrap();
    assert_eq!(ledger.last_issued(42).unwrap(), WORKERS as i64);
    assert!(ledger.verify(Some(42)).unwrap().is_empty());
}

#[test]
fn test_last_issued_while_writer_holds_lock() {
    let tmp = tempdir().unwrap();
    let path = tmp.path().join("ledger.db");
    {
        let mut ledger = LabelLedger::open(&path, &LedgerOptions::default()).unwrap();
        ledger.reserve(&pack42(5)).unwrap();
    }

    let writer = Connection::open(&path).unwrap();
    writer.execute_batch("BEGIN IMMEDIATE;").unwrap();

    let options = LedgerOptions::with_busy_timeout_ms(200);
    let reader = LabelLedger::open_existing(&path, &options).unwrap();
    assert_eq!(reader.last_issued(42).unwrap(), 5);
    assert_eq!(reader.history(42).unwrap().len(), 1);

    let created = LabelLedger::open(&path, &options).unwrap();
    assert_eq!(created.last_issued(42).unwrap(), 5);

    writer.execute_batch("ROLLBACK;").unwrap();
}

#[test]
fn test_open_existing_refuses_missing_file() {
    let tmp = tempdir().unwrap();
    let path = tmp.path().join("typo").join("ledger.db");

    match LabelLedger::open_existing(&path, &LedgerOptions::default()) {
        Err(LedgerError::NotFound { path: missing }) => assert_eq!(missing, path),
        Err(other) => panic!("unexpected error: {}", other),
        Ok(_) => panic!("missing ledger should not be created"),
    }
    assert!(!path.exists());
    assert!(!tmp.path().join("typo").exists());
}

#[test]
fn test_open_existing_reads_created_ledger() {
    let tmp = tempdir().unwrap();
    let path = tmp.path().join("ledger.db");
    LabelLedger::open(&path, &LedgerOptions::default())
        .unwrap()
        .reserve(&pack42(3))
        .unwrap();

    let mut ledger = LabelLedger::open_existing(&path, &LedgerOptions::default()).unwrap();
    assert_eq!(ledger.schema_version().unwrap(), SCHEMA_VERSION);
    assert_eq!(ledger.reserve(&pack42(2)).unwrap().start, 4);
}
