//! Workspace discovery and structure

use std::path::{Path, PathBuf};
use thiserror::Error;

/// Name of the directory marking a workspace root
pub const WORKSPACE_DIR: &str = ".cartons";

/// Ledger file created inside the workspace directory
pub const LEDGER_FILE: &str = "ledger.db";

/// A directory tree holding workspace config and the default ledger
#[derive(Debug, Clone)]
pub struct Workspace {
    /// Root directory of the workspace (parent of .cartons/)
    root: PathBuf,
}

impl Workspace {
    /// Find workspace root by walking up from the current directory
    pub fn discover() -> Result<Self, WorkspaceError> {
        let current =
            std::env::current_dir().map_err(|e| WorkspaceError::IoError(e.to_string()))?;
        Self::discover_from(&current)
    }

    /// Find workspace root by walking up from the given directory
    pub fn discover_from(start: &Path) -> Result<Self, WorkspaceError> {
        let mut current = start
            .canonicalize()
            .map_err(|e| WorkspaceError::IoError(e.to_string()))?;

        loop {
            if current.join(WORKSPACE_DIR).is_dir() {
                return Ok(Self { root: current });
            }

            if !current.pop() {
                return Err(WorkspaceError::NotFound {
                    searched_from: start.to_path_buf(),
                });
            }
        }
    }

    /// Create a new workspace at the given path
    pub fn init(path: &Path) -> Result<Self, WorkspaceError> {
        let root = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());

        if root.join(WORKSPACE_DIR).exists() {
            return Err(WorkspaceError::AlreadyExists(root));
        }

        Self::write_skeleton(root)
    }

    /// Initialize even if .cartons/ exists, rewriting the default config
    ///
    /// The ledger file is left untouched.
    pub fn init_force(path: &Path) -> Result<Self, WorkspaceError> {
        let root = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());
        Self::write_skeleton(root)
    }

    fn write_skeleton(root: PathBuf) -> Result<Self, WorkspaceError> {
        let dir = root.join(WORKSPACE_DIR);
        std::fs::create_dir_all(&dir).map_err(|e| WorkspaceError::IoError(e.to_string()))?;

        std::fs::write(dir.join("config.yaml"), Self::default_config())
            .map_err(|e| WorkspaceError::IoError(e.to_string()))?;

        Ok(Self { root })
    }

    fn default_config() -> &'static str {
        r#"# Carton ledger workspace configuration

# Ledger database (default: .cartons/ledger.db)
# ledger: ""

# User recorded on reservations (default: $USER)
# user: ""

# Milliseconds a reservation waits for the ledger lock
# busy_timeout_ms: 5000

# Default output format (auto, tsv, json, yaml, csv, md, id)
# default_format: auto
"#
    }

    /// Get the workspace root directory
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Get the .cartons directory
    pub fn cartons_dir(&self) -> PathBuf {
        self.root.join(WORKSPACE_DIR)
    }

    /// Workspace config file
    pub fn config_path(&self) -> PathBuf {
        self.cartons_dir().join("config.yaml")
    }

    /// Default ledger location for this workspace
    pub fn default_ledger_path(&self) -> PathBuf {
        self.cartons_dir().join(LEDGER_FILE)
    }
}

/// Errors related to workspace operations
#[derive(Debug, Error)]
pub enum WorkspaceError {
    #[error("not a cartons workspace (searched from {searched_from})")]
    NotFound { searched_from: PathBuf },

    #[error("cartons workspace already exists at {0}")]
    AlreadyExists(PathBuf),

    #[error("I/O error: {0}")]
    IoError(String),
}
