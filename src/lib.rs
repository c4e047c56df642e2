//! Carton label ledger
//!
//! Hands out contiguous, non-overlapping ranges of printed carton label
//! numbers per shipping package, recorded in an append-only SQLite ledger.

pub mod cli;
pub mod core;
