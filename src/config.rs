//! Configuration System
//!
//! Crate-level configuration: which directory tree is tracked, which files
//! count as structured documents, which block kind marks a query-engine
//! block, and how logging behaves. Loadable from a TOML file with
//! per-field defaults.

use crate::error::TrackerError;
use crate::logging::LoggingConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Root configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocketConfig {
    /// Root directory under which documents participate in tracking
    #[serde(default = "default_root")]
    pub root: PathBuf,

    /// File extensions treated as structured documents
    #[serde(default = "default_document_extensions")]
    pub document_extensions: Vec<String>,

    /// Block kind tag that marks a query-engine block in command
    /// definitions
    #[serde(default = "default_query_block_kind")]
    pub query_block_kind: String,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

fn default_root() -> PathBuf {
    PathBuf::from(".")
}

fn default_document_extensions() -> Vec<String> {
    vec!["org".to_string()]
}

fn default_query_block_kind() -> String {
    "query".to_string()
}

impl Default for DocketConfig {
    fn default() -> Self {
        Self {
            root: default_root(),
            document_extensions: default_document_extensions(),
            query_block_kind: default_query_block_kind(),
            logging: LoggingConfig::default(),
        }
    }
}

impl DocketConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self, TrackerError> {
        let raw = std::fs::read_to_string(path).map_err(|e| {
            TrackerError::Config(format!("Failed to read {}: {}", path.display(), e))
        })?;
        let config: DocketConfig = toml::from_str(&raw).map_err(|e| {
            TrackerError::Config(format!("Failed to parse {}: {}", path.display(), e))
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), TrackerError> {
        if self.root.as_os_str().is_empty() {
            return Err(TrackerError::Config("Root cannot be empty".to_string()));
        }
        if self.document_extensions.is_empty() {
            return Err(TrackerError::Config(
                "At least one document extension is required".to_string(),
            ));
        }
        if self.query_block_kind.is_empty() {
            return Err(TrackerError::Config(
                "Query block kind cannot be empty".to_string(),
            ));
        }
        Ok(())
    }

    /// Whether a path names a structured document by extension.
    pub fn is_tracked_document(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .map(|ext| self.document_extensions.iter().any(|e| e == ext))
            .unwrap_or(false)
    }

    /// Whether a path lies under the configured root.
    ///
    /// Compared on canonical forms when the root resolves; otherwise a
    /// plain prefix check.
    pub fn is_under_root(&self, path: &Path) -> bool {
        match (dunce::canonicalize(&self.root), dunce::canonicalize(path)) {
            (Ok(root), Ok(p)) => p.starts_with(&root),
            _ => path.starts_with(&self.root),
        }
    }
}
