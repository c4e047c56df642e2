//! CLI command implementations

pub mod completions;
pub mod config;
pub mod export;
pub mod history;
pub mod init;
pub mod labels;
pub mod last;
pub mod packages;
pub mod recent;
pub mod reserve;
pub mod status;
pub mod verify;
