//! Core module - ledger, configuration and workspace discovery

pub mod config;
pub mod ledger;
pub mod workspace;

pub use config::Config;
pub use ledger::{
    ContiguityViolation, LabelLedger, LabelRange, LedgerError, LedgerOptions, LedgerStats,
    PackageSummary, Reservation, ReservationRequest,
};
pub use workspace::{Workspace, WorkspaceError};
