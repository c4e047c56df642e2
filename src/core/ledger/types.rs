//! Ledger type definitions
//!
//! Rows read from the reservation table and the summaries derived from them.

use std::ops::RangeInclusive;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Default time a writer waits for the ledger lock before giving up
pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

// =========================================================================
// Requests
// =========================================================================

/// A request for a contiguous block of label numbers
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReservationRequest {
    pub package_id: i64,
    pub package_name: String,
    pub qty: i64,
    pub order_ref: Option<String>,
    pub user: Option<String>,
}

impl ReservationRequest {
    pub fn new(package_id: i64, package_name: impl Into<String>, qty: i64) -> Self {
        Self {
            package_id,
            package_name: package_name.into(),
            qty,
            order_ref: None,
            user: None,
        }
    }

    /// Attach the order this block of labels is printed for
    pub fn with_order(mut self, order_ref: impl Into<String>) -> Self {
        self.order_ref = Some(order_ref.into());
        self
    }

    /// Attach the user requesting the labels
    pub fn with_user(mut self, user: impl Into<String>) -> Self {
        self.user = Some(user.into());
        self
    }
}

/// Options applied when opening a ledger file
#[derive(Debug, Clone, Copy)]
pub struct LedgerOptions {
    /// How long a writer blocks on a locked ledger before failing
    pub busy_timeout: Duration,
}

impl Default for LedgerOptions {
    fn default() -> Self {
        Self {
            busy_timeout: Duration::from_millis(DEFAULT_BUSY_TIMEOUT_MS),
        }
    }
}

impl LedgerOptions {
    pub fn with_busy_timeout_ms(ms: u64) -> Self {
        Self {
            busy_timeout: Duration::from_millis(ms),
        }
    }
}

// =========================================================================
// Reservations
// =========================================================================

/// A range of label numbers handed out by a single reservation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LabelRange {
    pub start: i64,
    pub qty: i64,
}

impl LabelRange {
    /// Last number in the range (inclusive)
    pub fn last(&self) -> i64 {
        self.start + self.qty - 1
    }

    /// Every label number in the range
    pub fn numbers(&self) -> RangeInclusive<i64> {
        self.start..=self.last()
    }
}

/// One row of the reservation ledger
///
/// Serialized field names match the ledger's column names so exports stay
/// readable by tooling that queries the database directly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Reservation {
    pub id: i64,
    pub package_id: i64,
    pub package_name: String,
    #[serde(rename = "start_carton")]
    pub start: i64,
    pub qty: i64,
    #[serde(rename = "orden_name")]
    pub order_ref: Option<String>,
    #[serde(rename = "usuario")]
    pub user: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Reservation {
    pub fn range(&self) -> LabelRange {
        LabelRange {
            start: self.start,
            qty: self.qty,
        }
    }

    /// Last number issued by this reservation
    pub fn last(&self) -> i64 {
        self.range().last()
    }
}

// =========================================================================
// Summaries
// =========================================================================

/// Allocation state of a single package
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PackageSummary {
    pub package_id: i64,
    /// Name recorded by the most recent reservation
    pub package_name: String,
    pub reservations: usize,
    pub labels_issued: i64,
    pub last_issued: i64,
    pub last_reserved_at: DateTime<Utc>,
}

/// Ledger-wide statistics
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LedgerStats {
    pub total_reservations: usize,
    pub total_packages: usize,
    pub total_labels: i64,
    pub db_size_bytes: u64,
}

/// A stored reservation that does not continue its package's numbering
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContiguityViolation {
    pub package_id: i64,
    pub reservation_id: i64,
    pub expected_start: i64,
    pub actual_start: i64,
}
