use crate::domain::{RepoId, RepositoryCandidate, RepositoryMatcher, SearchEvent, SearchScope};
use crate::error::{FinderError, Result};
use crate::ports::{IndexQuery, IndexStream, IndexUpdate, MetadataIndex};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, warn};

/// One live metadata query over a fixed set of scopes.
///
/// Raw index updates are normalized into [`SearchEvent`]s as they are pulled
/// with [`next_event`](Self::next_event): the matcher travels with the
/// registered query and is applied by the index, hits that are not
/// directories are dropped, paths become normalized identities,
/// and per-scope failures are tracked so that a search where no scope could
/// be queried ends with a fatal error instead of an empty initial scan.
pub struct ScopeIndexSearch {
    scopes: Vec<SearchScope>,
    matcher: RepositoryMatcher,
    index: Arc<dyn MetadataIndex>,
    stream: Option<IndexStream>,
    unavailable: HashSet<SearchScope>,
    initial_scan_finished: bool,
}

impl ScopeIndexSearch {
    /// Build an inert search; nothing is registered until [`start`](Self::start)
    pub fn configure<I>(
        scopes: I,
        matcher: RepositoryMatcher,
        index: Arc<dyn MetadataIndex>,
    ) -> Result<Self>
    where
        I: IntoIterator<Item = SearchScope>,
    {
        let mut unique = Vec::new();
        for scope in scopes {
            if !unique.contains(&scope) {
                unique.push(scope);
            }
        }

        if unique.is_empty() {
            return Err(FinderError::config("at least one search scope is required"));
        }

        Ok(Self {
            scopes: unique,
            matcher,
            index,
            stream: None,
            unavailable: HashSet::new(),
            initial_scan_finished: false,
        })
    }

    pub fn scopes(&self) -> &[SearchScope] {
        &self.scopes
    }

    pub fn is_running(&self) -> bool {
        self.stream.is_some()
    }

    pub fn initial_scan_finished(&self) -> bool {
        self.initial_scan_finished
    }

    /// Register the query with the index
    pub fn start(&mut self) -> Result<()> {
        if self.stream.is_some() {
            return Err(FinderError::AlreadyRunning);
        }

        let stream = self.index.register(IndexQuery {
            scopes: self.scopes.clone(),
            matcher: self.matcher.clone(),
        })?;

        debug!(
            "Registered index query over {} scope(s) with matcher {}",
            self.scopes.len(),
            self.matcher.description()
        );
        self.unavailable.clear();
        self.initial_scan_finished = false;
        self.stream = Some(stream);
        Ok(())
    }

    /// Cancel the query. Safe to call at any time.
    pub fn stop(&mut self) {
        if let Some(mut stream) = self.stream.take() {
            stream.close();
            debug!("Index query cancelled");
        }
    }

    /// Next normalized event, or `None` once stopped or the index is done
    pub async fn next_event(&mut self) -> Option<SearchEvent> {
        loop {
            let update = self.stream.as_mut()?.recv().await;
            let Some(update) = update else {
                debug!("Index stream ended");
                self.stream = None;
                return None;
            };

            if let Some(event) = self.normalize(update) {
                return Some(event);
            }
        }
    }

    fn normalize(&mut self, update: IndexUpdate) -> Option<SearchEvent> {
        match update {
            IndexUpdate::Batch { hits, removed } => {
                // The index already applied the matcher off the event loop
                let added: Vec<_> = hits
                    .into_iter()
                    .filter(|hit| hit.is_dir)
                    .map(|hit| RepositoryCandidate::new(&hit.path, hit.version))
                    .collect();
                let removed: Vec<_> = removed.iter().map(|path| RepoId::from_path(path)).collect();

                if added.is_empty() && removed.is_empty() {
                    return None;
                }
                Some(SearchEvent::Batch { added, removed })
            }

            IndexUpdate::InitialScanComplete => {
                if self.initial_scan_finished {
                    debug!("Ignoring repeated initial scan marker");
                    return None;
                }
                self.initial_scan_finished = true;

                if self.unavailable.len() >= self.scopes.len() {
                    return Some(SearchEvent::Error(FinderError::index_unavailable(
                        "none of the search scopes could be queried",
                    )));
                }
                Some(SearchEvent::InitialScanFinished)
            }

            IndexUpdate::ScopeUnavailable { scope, reason } => {
                warn!("Search scope {} unavailable: {}", scope, reason);
                if self.scopes.contains(&scope) {
                    self.unavailable.insert(scope.clone());
                }
                Some(SearchEvent::Error(FinderError::ScopeUnavailable { scope, reason }))
            }

            IndexUpdate::Unavailable { reason } => {
                Some(SearchEvent::Error(FinderError::IndexUnavailable { reason }))
            }
        }
    }
}

impl Drop for ScopeIndexSearch {
    fn drop(&mut self) {
        self.stop();
    }
}
