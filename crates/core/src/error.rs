use crate::domain::scope::SearchScope;
use thiserror::Error;

/// Errors raised while configuring or running a repository search
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FinderError {
    #[error("Invalid search configuration: {reason}")]
    Config { reason: String },

    #[error("Search is already running")]
    AlreadyRunning,

    #[error("Search scope unavailable: {scope} ({reason})")]
    ScopeUnavailable { scope: SearchScope, reason: String },

    #[error("Metadata index unavailable: {reason}")]
    IndexUnavailable { reason: String },
}

impl FinderError {
    pub fn config<S: Into<String>>(reason: S) -> Self {
        Self::Config {
            reason: reason.into(),
        }
    }

    pub fn index_unavailable<S: Into<String>>(reason: S) -> Self {
        Self::IndexUnavailable {
            reason: reason.into(),
        }
    }

    /// Fatal errors end the current search run
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::IndexUnavailable { .. })
    }
}

pub type Result<T> = std::result::Result<T, FinderError>;
