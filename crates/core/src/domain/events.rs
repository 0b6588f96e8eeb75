use super::candidate::{RepoId, RepositoryCandidate};
use crate::error::FinderError;
use serde::{Deserialize, Serialize};

/// Lifecycle state of a repository finder
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SearchState {
    #[default]
    Idle,
    Searching,
    Stopping,
}

/// Events produced by a running scoped index search
#[derive(Debug, Clone, PartialEq)]
pub enum SearchEvent {
    /// Candidates found or updated, and identities that disappeared
    Batch {
        added: Vec<RepositoryCandidate>,
        removed: Vec<RepoId>,
    },

    /// The initial pass over indexed entries is done; live updates follow
    InitialScanFinished,

    /// A scope or the whole index failed
    Error(FinderError),
}

/// Observer notifications as plain values, one per protocol callback
#[derive(Debug, Clone, PartialEq)]
pub enum FinderEvent {
    StartedSearching,
    FoundRepositories(Vec<RepositoryCandidate>),
    RemovedRepositories(Vec<RepoId>),
    FinishedInitialScan(Vec<RepositoryCandidate>),
    StoppedSearching,
    Failed(FinderError),
}
