use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ReaperError {
    // Construction
    #[error("cannot scan root {path:?}")]
    Root {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot read supplementary groups")]
    Groups(#[source] std::io::Error),

    #[error("owner and device metadata are not available on this platform")]
    UnsupportedPlatform,

    // Config
    #[error("invalid protection pattern {pattern:?}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: globset::Error,
    },

    #[error("expiry must be a duration > 0")]
    InvalidExpiry,

    #[error("invalid duration {0:?}")]
    InvalidDuration(String),

    // Traversal
    #[error("permission denied at {0:?}")]
    PermissionDenied(PathBuf),

    #[error("IO error at {path:?}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // Runtime
    #[error("cannot start walker thread")]
    Spawn(#[source] std::io::Error),

    #[error("walker thread panicked")]
    WalkerPanicked,
}

impl ReaperError {
    /// The path this error occurred at, if applicable.
    pub fn path(&self) -> Option<&PathBuf> {
        match self {
            Self::Root { path: p, .. }
            | Self::PermissionDenied(p)
            | Self::Io { path: p, .. } => Some(p),
            _ => None,
        }
    }

    /// Whether the walk keeps going after this error.
    ///
    /// Recoverable errors are per-entry traversal failures: they become the
    /// session's terminal error but sibling subtrees are still visited.
    /// Everything else stops a session from ever starting.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::PermissionDenied(_) | Self::Io { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn traversal_errors_are_recoverable() {
        let denied = ReaperError::PermissionDenied("/srv/locked".into());
        assert!(denied.is_recoverable());
        assert_eq!(denied.path(), Some(&PathBuf::from("/srv/locked")));

        assert!(!ReaperError::InvalidExpiry.is_recoverable());
        assert!(ReaperError::InvalidExpiry.path().is_none());
    }
}
