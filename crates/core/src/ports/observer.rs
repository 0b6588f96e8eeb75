use crate::domain::{FinderEvent, RepoId, RepositoryCandidate};
use crate::error::FinderError;
use std::sync::Arc;
use tokio::sync::mpsc;

/// Receives finder notifications.
///
/// All methods run on the finder's event loop, one at a time, and receive
/// owned snapshots. Every method defaults to doing nothing.
pub trait FinderObserver: Send + Sync {
    fn did_start_searching(&self) {}

    fn did_find_repositories(&self, _added: Vec<RepositoryCandidate>) {}

    fn did_remove_repositories(&self, _removed: Vec<RepoId>) {}

    fn did_finish_initial_scan(&self, _current_results: Vec<RepositoryCandidate>) {}

    fn did_stop_searching(&self) {}

    fn did_fail_with_error(&self, _error: FinderError) {}
}

/// Observer that turns notifications into a stream of [`FinderEvent`]s
pub struct ChannelObserver {
    tx: mpsc::UnboundedSender<FinderEvent>,
}

impl ChannelObserver {
    /// The finder only holds a weak reference, so keep the returned `Arc`
    /// alive for as long as events are wanted.
    pub fn new() -> (Arc<Self>, mpsc::UnboundedReceiver<FinderEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Arc::new(Self { tx }), rx)
    }

    fn forward(&self, event: FinderEvent) {
        // Receiver gone means nobody is listening anymore
        let _ = self.tx.send(event);
    }
}

impl FinderObserver for ChannelObserver {
    fn did_start_searching(&self) {
        self.forward(FinderEvent::StartedSearching);
    }

    fn did_find_repositories(&self, added: Vec<RepositoryCandidate>) {
        self.forward(FinderEvent::FoundRepositories(added));
    }

    fn did_remove_repositories(&self, removed: Vec<RepoId>) {
        self.forward(FinderEvent::RemovedRepositories(removed));
    }

    fn did_finish_initial_scan(&self, current_results: Vec<RepositoryCandidate>) {
        self.forward(FinderEvent::FinishedInitialScan(current_results));
    }

    fn did_stop_searching(&self) {
        self.forward(FinderEvent::StoppedSearching);
    }

    fn did_fail_with_error(&self, error: FinderError) {
        self.forward(FinderEvent::Failed(error));
    }
}
