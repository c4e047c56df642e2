//! Configuration management with layered hierarchy

use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::core::ledger::{LedgerOptions, DEFAULT_BUSY_TIMEOUT_MS};
use crate::core::Workspace;

/// Environment variable overriding the ledger path
pub const ENV_LEDGER: &str = "CARTONS_LEDGER";
/// Environment variable overriding the recorded user
pub const ENV_USER: &str = "CARTONS_USER";
/// Environment variable overriding the lock wait
pub const ENV_BUSY_TIMEOUT_MS: &str = "CARTONS_BUSY_TIMEOUT_MS";

/// Cartons configuration with layered hierarchy
#[derive(Debug, Default, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Ledger database path (relative paths resolve against the workspace root)
    pub ledger: Option<PathBuf>,

    /// User recorded on new reservations
    pub user: Option<String>,

    /// Milliseconds a writer waits for the ledger lock
    pub busy_timeout_ms: Option<u64>,

    /// Default output format
    pub default_format: Option<String>,
}

impl Config {
    /// Load configuration for a known workspace (or none)
    pub fn load_for(workspace: Option<&Workspace>) -> Self {
        Self::load_layers(
            Self::global_config_path().as_deref(),
            workspace,
            |key| std::env::var(key).ok(),
        )
    }

    /// Merge the config layers, lowest priority first
    fn load_layers(
        global_path: Option<&Path>,
        workspace: Option<&Workspace>,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Self {
        let mut config = Config::default();

        // 1. Global user config (~/.config/cartons/config.yaml)
        if let Some(global) = global_path.and_then(Self::read_file) {
            config.merge(global);
        }

        // 2. Workspace config (.cartons/config.yaml)
        if let Some(ws) = workspace {
            if let Some(mut ws_config) = Self::read_file(&ws.config_path()) {
                if let Some(ledger) = ws_config.ledger.take() {
                    ws_config.ledger = Some(resolve_against(ws.root(), ledger));
                }
                config.merge(ws_config);
            }
        }

        // 3. Environment variables
        config.merge(Self::from_env(lookup));

        config
    }

    /// Read a single YAML config file, ignoring missing or malformed files
    pub fn read_file(path: &Path) -> Option<Self> {
        if !path.exists() {
            return None;
        }
        let contents = std::fs::read_to_string(path).ok()?;
        match serde_yml::from_str::<Option<Config>>(&contents) {
            Ok(parsed) => Some(parsed.unwrap_or_default()),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "ignoring malformed config file");
                None
            }
        }
    }

    /// Build the environment layer from a variable lookup
    fn from_env(lookup: impl Fn(&str) -> Option<String>) -> Self {
        Config {
            ledger: lookup(ENV_LEDGER)
                .filter(|v| !v.is_empty())
                .map(PathBuf::from),
            user: lookup(ENV_USER).filter(|v| !v.is_empty()),
            busy_timeout_ms: lookup(ENV_BUSY_TIMEOUT_MS).and_then(|v| v.trim().parse().ok()),
            default_format: None,
        }
    }

    /// Get the path to the global config file
    pub fn global_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("", "", "cartons")
            .map(|dirs| dirs.config_dir().join("config.yaml"))
    }

    /// Merge another config into this one (other takes precedence)
    pub fn merge(&mut self, other: Config) {
        if other.ledger.is_some() {
            self.ledger = other.ledger;
        }
        if other.user.is_some() {
            self.user = other.user;
        }
        if other.busy_timeout_ms.is_some() {
            self.busy_timeout_ms = other.busy_timeout_ms;
        }
        if other.default_format.is_some() {
            self.default_format = other.default_format;
        }
    }

    /// Get the user name, falling back to the login name
    pub fn user(&self) -> Option<String> {
        if let Some(ref user) = self.user {
            return Some(user.clone());
        }

        std::env::var("USER")
            .or_else(|_| std::env::var("USERNAME"))
            .ok()
            .filter(|u| !u.is_empty())
    }

    /// Resolve the ledger path: explicit config first, then the workspace default
    pub fn ledger_path(&self, workspace: Option<&Workspace>) -> Option<PathBuf> {
        self.ledger
            .clone()
            .or_else(|| workspace.map(|ws| ws.default_ledger_path()))
    }

    /// Options used to open the ledger
    pub fn ledger_options(&self) -> LedgerOptions {
        LedgerOptions::with_busy_timeout_ms(self.busy_timeout_ms.unwrap_or(DEFAULT_BUSY_TIMEOUT_MS))
    }
}

fn resolve_against(root: &Path, path: PathBuf) -> PathBuf {
    if path.is_absolute() {
        path
    } else {
        root.join(path)
    }
}
