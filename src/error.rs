//! Error types shared by the client and the walkers

use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// A single remote call failed: non-200 status, connection error or timeout
    #[error("{op} {path} failed: {reason}")]
    Transport {
        op: &'static str,
        path: String,
        reason: String,
    },

    /// A listing that should have produced content did not
    #[error("inconsistent remote tree at {path}: {reason}")]
    InconsistentTree { path: String, reason: String },

    #[error("invalid remote path {0:?}")]
    InvalidPath(String),

    #[error("local root {}: {reason}", .path.display())]
    LocalRoot { path: PathBuf, reason: String },

    /// A local entry the mirror cannot reproduce on the device
    #[error("local entry {}: {reason}", .path.display())]
    LocalEntry { path: PathBuf, reason: String },

    #[error("invalid device url: {0}")]
    Url(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl Error {
    pub(crate) fn transport(op: &'static str, path: impl Into<String>, reason: impl ToString) -> Self {
        Error::Transport {
            op,
            path: path.into(),
            reason: reason.to_string(),
        }
    }

    pub(crate) fn inconsistent(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Error::InconsistentTree {
            path: path.into(),
            reason: reason.into(),
        }
    }

    pub(crate) fn local_entry(path: &std::path::Path, reason: impl Into<String>) -> Self {
        Error::LocalEntry {
            path: path.to_path_buf(),
            reason: reason.into(),
        }
    }

    /// True for failures of a single remote round trip
    pub fn is_transport(&self) -> bool {
        matches!(self, Error::Transport { .. })
    }
}
