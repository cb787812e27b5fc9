use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::engine::SyncReport;

/// Failure modes surfaced by the engine and descriptor layers.
#[derive(Debug, Error)]
pub enum SyncError {
    /// The `.sync` file is unparseable, or neither `target` nor
    /// `name` + storage root resolves to a destination.
    #[error("invalid descriptor: {0}")]
    InvalidDescriptor(String),

    #[error("not a directory: {}", .0.display())]
    NotADirectory(PathBuf),

    #[error(".sync already exists: {}", .0.display())]
    DescriptorExists(PathBuf),

    #[error("failed to {op} {}: {source}", path.display())]
    Io {
        op: &'static str,
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl SyncError {
    pub(crate) fn io(op: &'static str, path: impl Into<PathBuf>) -> impl FnOnce(io::Error) -> Self {
        let path = path.into();
        move |source| SyncError::Io { op, path, source }
    }
}

/// A sync run that aborted partway. The counts accumulated before the
/// abort are preserved rather than discarded, so callers can report how
/// far the run got.
#[derive(Debug, Error)]
#[error("{error}")]
pub struct SyncFailure {
    pub partial: SyncReport,
    #[source]
    pub error: SyncError,
}
