use thiserror::Error;

pub type Result<T> = std::result::Result<T, TreeExplorerError>;

/// Errors produced at the parsing boundary. The generation engine itself has
/// no failure modes; malformed view operations are silent no-ops.
#[derive(Debug, Error)]
pub enum TreeExplorerError {
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid tree entry {path:?}: {reason}")]
    InvalidEntry { path: String, reason: String },
}

impl TreeExplorerError {
    pub fn invalid_entry(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidEntry {
            path: path.into(),
            reason: reason.into(),
        }
    }
}
