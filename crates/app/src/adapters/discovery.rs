use repofinder_core::domain::{IndexVersion, RepositoryMatcher, SearchScope, GIT_MARKER};
use repofinder_core::error::{FinderError, Result};
use repofinder_core::ports::{IndexHit, IndexQuery, IndexStream, IndexUpdate, MetadataIndex};
use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::{Duration, UNIX_EPOCH};
use tokio::sync::mpsc::{self, UnboundedSender};
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info};
use walkdir::{DirEntry, WalkDir};

/// Tuning for the filesystem-backed index
#[derive(Debug, Clone, PartialEq)]
pub struct DiscoveryOptions {
    /// What `SearchScope::LocalComputer` expands to
    pub local_roots: Vec<PathBuf>,
    pub live_updates: bool,
    pub rescan_interval: Duration,
    pub batch_size: usize,
    pub follow_links: bool,
    pub max_depth: Option<usize>,
}

impl Default for DiscoveryOptions {
    fn default() -> Self {
        Self {
            local_roots: dirs::home_dir().into_iter().collect(),
            live_updates: true,
            rescan_interval: Duration::from_secs(5),
            batch_size: 64,
            follow_links: false,
            max_depth: None,
        }
    }
}

/// File system discovery adapter that implements MetadataIndex.
///
/// Each registered query walks its scopes once for the initial scan and,
/// with live updates on, rescans them periodically and reports the
/// difference. Walking happens on blocking threads.
#[derive(Debug, Clone, Default)]
pub struct FsDiscoveryAdapter {
    options: DiscoveryOptions,
}

impl FsDiscoveryAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: DiscoveryOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &DiscoveryOptions {
        &self.options
    }
}

impl MetadataIndex for FsDiscoveryAdapter {
    fn register(&self, query: IndexQuery) -> Result<IndexStream> {
        let runtime = tokio::runtime::Handle::try_current().map_err(|e| {
            FinderError::index_unavailable(format!("no async runtime to run the query: {}", e))
        })?;

        let (tx, rx) = mpsc::unbounded_channel();
        runtime.spawn(run_query(self.options.clone(), query, tx));
        Ok(rx)
    }
}

/// Hits and unavailable scopes seen by one pass over the scopes
#[derive(Debug, Default, Clone, PartialEq)]
struct ScanSnapshot {
    hits: HashMap<PathBuf, IndexVersion>,
    unavailable: HashMap<SearchScope, String>,
}

async fn run_query(options: DiscoveryOptions, query: IndexQuery, tx: UnboundedSender<IndexUpdate>) {
    info!("Discovery starting over {} scope(s)", query.scopes.len());

    let Some(mut known) = scan_blocking(&options, &query, &tx, true).await else {
        debug!("Discovery cancelled during initial scan");
        return;
    };

    info!("Initial scan found {} repositories", known.hits.len());
    if tx.send(IndexUpdate::InitialScanComplete).is_err() {
        return;
    }

    if !options.live_updates {
        debug!("Live updates disabled, closing discovery stream");
        return;
    }

    let mut ticker = tokio::time::interval(options.rescan_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // The first tick completes immediately
    ticker.tick().await;

    loop {
        tokio::select! {
            _ = tx.closed() => {
                debug!("Discovery query closed by consumer");
                break;
            }
            _ = ticker.tick() => {
                let Some(current) = scan_blocking(&options, &query, &tx, false).await else {
                    break;
                };

                for update in diff_snapshots(&known, &current) {
                    if tx.send(update).is_err() {
                        return;
                    }
                }
                known = current;
            }
        }
    }
}

/// Run one pass on a blocking thread; `None` when cancelled or failed
async fn scan_blocking(
    options: &DiscoveryOptions,
    query: &IndexQuery,
    tx: &UnboundedSender<IndexUpdate>,
    streaming: bool,
) -> Option<ScanSnapshot> {
    let options = options.clone();
    let scopes = query.scopes.clone();
    let matcher = query.matcher.clone();
    let worker_tx = tx.clone();

    // Run discovery in spawn_blocking since walking is I/O bound
    let result = tokio::task::spawn_blocking(move || {
        ScopeScanner::new(&matcher, &options, &worker_tx, streaming).scan(&scopes)
    })
    .await;

    match result {
        Ok(snapshot) => snapshot,
        Err(e) => {
            error!("Discovery scan task failed: {}", e);
            let _ = tx.send(IndexUpdate::Unavailable {
                reason: format!("scan task failed: {}", e),
            });
            None
        }
    }
}

fn diff_snapshots(previous: &ScanSnapshot, current: &ScanSnapshot) -> Vec<IndexUpdate> {
    let mut updates = Vec::new();

    for (scope, reason) in &current.unavailable {
        if !previous.unavailable.contains_key(scope) {
            updates.push(IndexUpdate::ScopeUnavailable {
                scope: scope.clone(),
                reason: reason.clone(),
            });
        }
    }
    for scope in previous.unavailable.keys() {
        if !current.unavailable.contains_key(scope) {
            info!("Search scope {} is available again", scope);
        }
    }

    let mut hits: Vec<IndexHit> = current
        .hits
        .iter()
        .filter(|(path, version)| previous.hits.get(*path) != Some(*version))
        .map(|(path, version)| IndexHit::directory(path.clone(), *version))
        .collect();
    hits.sort_by(|a, b| a.path.cmp(&b.path));

    let mut removed: Vec<PathBuf> = previous
        .hits
        .keys()
        .filter(|path| !current.hits.contains_key(*path))
        .cloned()
        .collect();
    removed.sort();

    if !hits.is_empty() || !removed.is_empty() {
        debug!("Rescan: {} added or changed, {} removed", hits.len(), removed.len());
        updates.push(IndexUpdate::Batch { hits, removed });
    }
    updates
}

/// One blocking pass over a list of scopes
struct ScopeScanner<'a> {
    matcher: &'a RepositoryMatcher,
    options: &'a DiscoveryOptions,
    tx: &'a UnboundedSender<IndexUpdate>,
    streaming: bool,
    snapshot: ScanSnapshot,
    batch: Vec<IndexHit>,
}

impl<'a> ScopeScanner<'a> {
    fn new(
        matcher: &'a RepositoryMatcher,
        options: &'a DiscoveryOptions,
        tx: &'a UnboundedSender<IndexUpdate>,
        streaming: bool,
    ) -> Self {
        Self {
            matcher,
            options,
            tx,
            streaming,
            snapshot: ScanSnapshot::default(),
            batch: Vec::new(),
        }
    }

    fn cancelled(&self) -> bool {
        self.tx.is_closed()
    }

    fn scan(mut self, scopes: &[SearchScope]) -> Option<ScanSnapshot> {
        for scope in scopes {
            let roots = resolve_roots(scope, self.options);
            if roots.is_empty() {
                if !self.scope_failed(scope, "no local roots configured".to_string()) {
                    return None;
                }
                continue;
            }

            let mut first_error = None;
            let mut any_available = false;
            for root in &roots {
                match self.walk_root(scope, root) {
                    Ok(true) => any_available = true,
                    Ok(false) => return None,
                    Err(reason) => {
                        debug!("Cannot walk {}: {}", root.display(), reason);
                        first_error.get_or_insert(reason);
                    }
                }
            }

            if !self.flush() {
                return None;
            }
            if !any_available {
                let reason = first_error.unwrap_or_else(|| "unavailable".to_string());
                if !self.scope_failed(scope, reason) {
                    return None;
                }
            }
        }

        Some(self.snapshot)
    }

    /// `Ok(false)` means the query was cancelled mid-walk
    fn walk_root(&mut self, scope: &SearchScope, root: &Path) -> std::result::Result<bool, String> {
        check_root(scope, root)?;

        let mut walker = WalkDir::new(root).follow_links(self.options.follow_links);
        if let Some(depth) = self.options.max_depth {
            walker = walker.max_depth(depth);
        }

        let mut entries = walker.into_iter().filter_entry(|e| {
            // Only directories can be repositories; never enter .git itself
            e.file_type().is_dir() && e.file_name() != GIT_MARKER
        });

        while let Some(entry) = entries.next() {
            if self.cancelled() {
                return Ok(false);
            }

            let entry = match entry {
                Ok(entry) => entry,
                Err(e) if e.depth() == 0 => return Err(e.to_string()),
                Err(e) => {
                    debug!("Skipping unreadable entry: {}", e);
                    continue;
                }
            };

            if self.matcher.matches(entry.path()) {
                // Don't descend into a repository
                entries.skip_current_dir();
                let hit = IndexHit::directory(entry.path(), entry_version(&entry));
                if !self.record(hit) {
                    return Ok(false);
                }
            }
        }

        Ok(true)
    }

    fn record(&mut self, hit: IndexHit) -> bool {
        self.snapshot.hits.insert(hit.path.clone(), hit.version);
        if !self.streaming {
            return true;
        }

        self.batch.push(hit);
        if self.batch.len() >= self.options.batch_size.max(1) {
            return self.flush();
        }
        true
    }

    fn flush(&mut self) -> bool {
        if !self.streaming || self.batch.is_empty() {
            return !self.cancelled();
        }

        let hits = std::mem::take(&mut self.batch);
        self.tx
            .send(IndexUpdate::Batch {
                hits,
                removed: Vec::new(),
            })
            .is_ok()
    }

    fn scope_failed(&mut self, scope: &SearchScope, reason: String) -> bool {
        self.snapshot.unavailable.insert(scope.clone(), reason.clone());
        if !self.streaming {
            return !self.cancelled();
        }

        self.tx
            .send(IndexUpdate::ScopeUnavailable {
                scope: scope.clone(),
                reason,
            })
            .is_ok()
    }
}

fn resolve_roots(scope: &SearchScope, options: &DiscoveryOptions) -> Vec<PathBuf> {
    match scope {
        SearchScope::Directory(path) | SearchScope::Volume(path) => vec![path.clone()],
        SearchScope::LocalComputer => options.local_roots.clone(),
    }
}

fn check_root(scope: &SearchScope, root: &Path) -> std::result::Result<(), String> {
    let metadata = match fs::metadata(root) {
        Ok(metadata) => metadata,
        Err(e) if e.kind() == ErrorKind::NotFound && matches!(scope, SearchScope::Volume(_)) => {
            return Err("volume not mounted".to_string());
        }
        Err(e) => return Err(e.to_string()),
    };

    if !metadata.is_dir() {
        return Err("not a directory".to_string());
    }

    // Listing fails early for unreadable roots
    fs::read_dir(root).map_err(|e| e.to_string())?;
    Ok(())
}

fn entry_version(entry: &DirEntry) -> IndexVersion {
    entry
        .metadata()
        .ok()
        .and_then(|metadata| metadata.modified().ok())
        .and_then(|modified| modified.duration_since(UNIX_EPOCH).ok())
        .map(version_from_elapsed)
        .unwrap_or_default()
}

/// Nanoseconds since the epoch, saturating far past the year 2500
fn version_from_elapsed(elapsed: Duration) -> IndexVersion {
    IndexVersion(u64::try_from(elapsed.as_nanos()).unwrap_or(u64::MAX))
}
