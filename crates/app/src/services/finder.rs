use anyhow::{Context, Result};
use repofinder_core::domain::{
    default_repository_matcher, MergeOutcome, RepositoryCandidate, RepositoryMatcher, ResultSet,
    SearchEvent, SearchScope, SearchState,
};
use repofinder_core::error::FinderError;
use repofinder_core::ports::{FinderObserver, MetadataIndex};
use repofinder_core::ScopeIndexSearch;
use std::sync::{Arc, Weak};
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, error, info, trace, warn};

/// Commands funneled into the finder's event loop
enum FinderCommand {
    SetObserver(Option<Weak<dyn FinderObserver>>),
    Start,
    Stop,
    Results(oneshot::Sender<Vec<RepositoryCandidate>>),
    State(oneshot::Sender<SearchState>),
}

/// Discovers repositories under a fixed set of scopes and reports them to an
/// observer.
///
/// The finder owns a single event-loop task. `start_query`, `stop_query` and
/// observer registration only enqueue commands, so they return immediately
/// and can be called from anywhere; the loop applies them in order, merges
/// search batches into the result set and calls the observer, all on the
/// same task. Dropping the finder closes the queue: commands already sent
/// are still applied, then the active search is cancelled and the loop exits.
pub struct RepositoryFinder {
    scopes: Vec<SearchScope>,
    command_tx: mpsc::UnboundedSender<FinderCommand>,
}

impl RepositoryFinder {
    /// Create a finder. An empty scope list means
    /// [`SearchScope::LocalComputer`]. Must be called within a tokio runtime.
    pub fn new(
        scopes: Vec<SearchScope>,
        matcher: RepositoryMatcher,
        index: Arc<dyn MetadataIndex>,
    ) -> std::result::Result<Self, FinderError> {
        let scopes = validate_scopes(scopes)?;
        let runtime = tokio::runtime::Handle::try_current().map_err(|_| {
            FinderError::config("a repository finder must be created inside a tokio runtime")
        })?;

        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let event_loop = FinderLoop {
            scopes: scopes.clone(),
            matcher,
            index,
            state: SearchState::Idle,
            results: ResultSet::new(),
            search: None,
            observer: None,
            command_rx,
        };

        info!("Repository finder created for {} scope(s)", scopes.len());
        runtime.spawn(event_loop.run());

        Ok(Self { scopes, command_tx })
    }

    /// Create a finder that uses the `.git` directory matcher
    pub fn with_default_matcher(
        scopes: Vec<SearchScope>,
        index: Arc<dyn MetadataIndex>,
    ) -> std::result::Result<Self, FinderError> {
        Self::new(scopes, default_repository_matcher(), index)
    }

    pub fn scopes(&self) -> &[SearchScope] {
        &self.scopes
    }

    /// Register the observer. Only a weak reference is kept; once the caller
    /// drops its `Arc`, notifications are dropped.
    pub fn set_observer<O: FinderObserver + 'static>(&self, observer: &Arc<O>) {
        let observer: Weak<O> = Arc::downgrade(observer);
        self.send(FinderCommand::SetObserver(Some(observer)));
    }

    pub fn clear_observer(&self) {
        self.send(FinderCommand::SetObserver(None));
    }

    /// Begin searching. No-op while a search is running.
    pub fn start_query(&self) {
        self.send(FinderCommand::Start);
    }

    /// Cancel the running search. No-op when idle.
    pub fn stop_query(&self) {
        self.send(FinderCommand::Stop);
    }

    /// Copy of the current results in discovery order
    pub async fn results(&self) -> Result<Vec<RepositoryCandidate>> {
        let (tx, rx) = oneshot::channel();
        self.send(FinderCommand::Results(tx));
        rx.await.context("Repository finder event loop has stopped")
    }

    pub async fn state(&self) -> Result<SearchState> {
        let (tx, rx) = oneshot::channel();
        self.send(FinderCommand::State(tx));
        rx.await.context("Repository finder event loop has stopped")
    }

    fn send(&self, command: FinderCommand) {
        if self.command_tx.send(command).is_err() {
            warn!("Repository finder event loop is gone, command dropped");
        }
    }
}

fn validate_scopes(scopes: Vec<SearchScope>) -> std::result::Result<Vec<SearchScope>, FinderError> {
    if scopes.is_empty() {
        info!("No search scopes given, searching all local volumes");
        return Ok(vec![SearchScope::LocalComputer]);
    }

    let mut unique = Vec::with_capacity(scopes.len());
    for scope in scopes {
        if let Some(path) = scope.path() {
            if !path.is_absolute() {
                return Err(FinderError::config(format!(
                    "search scope must be an absolute path: {}",
                    path.display()
                )));
            }
        }
        if !unique.contains(&scope) {
            unique.push(scope);
        }
    }
    Ok(unique)
}

/// State owned by the event-loop task
struct FinderLoop {
    scopes: Vec<SearchScope>,
    matcher: RepositoryMatcher,
    index: Arc<dyn MetadataIndex>,
    state: SearchState,
    results: ResultSet,
    search: Option<ScopeIndexSearch>,
    observer: Option<Weak<dyn FinderObserver>>,
    command_rx: mpsc::UnboundedReceiver<FinderCommand>,
}

impl FinderLoop {
    async fn run(mut self) {
        debug!("Repository finder event loop starting");

        loop {
            let streaming = self.search.as_ref().is_some_and(ScopeIndexSearch::is_running);

            tokio::select! {
                // Commands first, so a stop wins over pending search events
                biased;

                command = self.command_rx.recv() => {
                    match command {
                        Some(command) => self.handle_command(command),
                        None => {
                            debug!("Repository finder dropped, stopping event loop");
                            break;
                        }
                    }
                }

                event = next_search_event(&mut self.search), if streaming => {
                    match event {
                        Some(event) => self.handle_search_event(event),
                        None => self.handle_stream_end(),
                    }
                }
            }
        }

        if let Some(mut search) = self.search.take() {
            search.stop();
        }
    }

    fn handle_command(&mut self, command: FinderCommand) {
        match command {
            FinderCommand::SetObserver(observer) => self.observer = observer,
            FinderCommand::Start => self.start(),
            FinderCommand::Stop => self.stop(),
            FinderCommand::Results(reply) => {
                let _ = reply.send(self.results.snapshot());
            }
            FinderCommand::State(reply) => {
                let _ = reply.send(self.state);
            }
        }
    }

    fn start(&mut self) {
        if self.state == SearchState::Searching {
            debug!("Search already running, ignoring start");
            return;
        }

        self.results.clear();
        self.state = SearchState::Searching;
        info!("Repository search starting");
        self.notify(|observer| observer.did_start_searching());

        let started = ScopeIndexSearch::configure(
            self.scopes.iter().cloned(),
            self.matcher.clone(),
            self.index.clone(),
        )
        .and_then(|mut search| search.start().map(|()| search));

        match started {
            Ok(search) => self.search = Some(search),
            Err(e) => self.fail(e),
        }
    }

    fn stop(&mut self) {
        if self.state == SearchState::Idle {
            debug!("No search running, ignoring stop");
            return;
        }

        self.state = SearchState::Stopping;
        if let Some(mut search) = self.search.take() {
            search.stop();
        }
        self.state = SearchState::Idle;

        info!("Repository search stopped with {} result(s)", self.results.len());
        self.notify(|observer| observer.did_stop_searching());
    }

    /// End the run after a fatal error, reporting it once
    fn fail(&mut self, error: FinderError) {
        error!("Repository search failed: {}", error);
        self.notify(|observer| observer.did_fail_with_error(error));
        self.stop();
    }

    fn handle_search_event(&mut self, event: SearchEvent) {
        match event {
            SearchEvent::Batch { added, removed } => {
                let found: Vec<_> = added
                    .into_iter()
                    .filter(|candidate| self.results.merge(candidate.clone()) != MergeOutcome::Unchanged)
                    .collect();
                let gone: Vec<_> = removed
                    .into_iter()
                    .filter(|id| self.results.remove(id).is_some())
                    .collect();

                debug!("Batch merged: {} found, {} removed", found.len(), gone.len());
                if !found.is_empty() {
                    self.notify(|observer| observer.did_find_repositories(found));
                }
                if !gone.is_empty() {
                    self.notify(|observer| observer.did_remove_repositories(gone));
                }
            }

            SearchEvent::InitialScanFinished => {
                info!("Initial scan finished with {} repositories", self.results.len());
                let snapshot = self.results.snapshot();
                self.notify(|observer| observer.did_finish_initial_scan(snapshot));
            }

            SearchEvent::Error(e) if e.is_fatal() => self.fail(e),

            SearchEvent::Error(e) => {
                self.notify(|observer| observer.did_fail_with_error(e));
            }
        }
    }

    fn handle_stream_end(&mut self) {
        let initial_scan_finished = self
            .search
            .as_ref()
            .is_some_and(ScopeIndexSearch::initial_scan_finished);

        if initial_scan_finished {
            // Live updates are over; keep results until the caller stops
            debug!("Index stopped delivering live updates");
        } else {
            self.fail(FinderError::index_unavailable(
                "index stream ended before the initial scan completed",
            ));
        }
    }

    /// Deliver to the observer if it is still alive, otherwise drop
    fn notify<F>(&self, deliver: F)
    where
        F: FnOnce(&dyn FinderObserver),
    {
        match self.observer.as_ref().and_then(Weak::upgrade) {
            Some(observer) => deliver(&*observer),
            None => trace!("No live observer, notification dropped"),
        }
    }
}

async fn next_search_event(search: &mut Option<ScopeIndexSearch>) -> Option<SearchEvent> {
    match search {
        Some(search) => search.next_event().await,
        None => std::future::pending().await,
    }
}
