//! In-memory metadata index for driving searches from tests

use crate::domain::{IndexVersion, SearchScope};
use crate::error::{FinderError, Result};
use crate::ports::{IndexHit, IndexQuery, IndexStream, IndexUpdate, MetadataIndex};
use std::path::PathBuf;
use std::sync::{Mutex, PoisonError};
use tokio::sync::mpsc;

/// Producer side of one registered query
#[derive(Debug, Clone)]
pub struct IndexFeed {
    pub scopes: Vec<SearchScope>,
    tx: mpsc::UnboundedSender<IndexUpdate>,
}

impl IndexFeed {
    /// Returns false once the query has been cancelled
    pub fn send(&self, update: IndexUpdate) -> bool {
        self.tx.send(update).is_ok()
    }

    pub fn add(&self, hits: Vec<IndexHit>) -> bool {
        self.send(IndexUpdate::Batch {
            hits,
            removed: Vec::new(),
        })
    }

    pub fn remove<P: Into<PathBuf>>(&self, paths: Vec<P>) -> bool {
        self.send(IndexUpdate::Batch {
            hits: Vec::new(),
            removed: paths.into_iter().map(Into::into).collect(),
        })
    }

    pub fn finish_initial_scan(&self) -> bool {
        self.send(IndexUpdate::InitialScanComplete)
    }

    pub fn scope_unavailable<S: Into<String>>(&self, scope: SearchScope, reason: S) -> bool {
        self.send(IndexUpdate::ScopeUnavailable {
            scope,
            reason: reason.into(),
        })
    }

    pub fn unavailable<S: Into<String>>(&self, reason: S) -> bool {
        self.send(IndexUpdate::Unavailable {
            reason: reason.into(),
        })
    }

    pub fn is_cancelled(&self) -> bool {
        self.tx.is_closed()
    }
}

/// Index whose contents are pushed by the test through [`IndexFeed`]s.
/// It never runs the query's matcher; tests push only matching hits.
#[derive(Debug, Default)]
pub struct ManualIndex {
    feeds: Mutex<Vec<IndexFeed>>,
    next_failure: Mutex<Option<FinderError>>,
}

impl ManualIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next `register` call fail with `error`
    pub fn fail_next_registration(&self, error: FinderError) {
        *self.next_failure.lock().unwrap_or_else(PoisonError::into_inner) = Some(error);
    }

    pub fn registrations(&self) -> usize {
        self.feeds.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Drop every retained feed so streams end once test clones are gone
    pub fn close_feeds(&self) {
        self.feeds.lock().unwrap_or_else(PoisonError::into_inner).clear();
    }

    pub fn latest_feed(&self) -> Option<IndexFeed> {
        self.feeds
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .last()
            .cloned()
    }
}

impl MetadataIndex for ManualIndex {
    fn register(&self, query: IndexQuery) -> Result<IndexStream> {
        if let Some(error) = self
            .next_failure
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
        {
            return Err(error);
        }

        let (tx, rx) = mpsc::unbounded_channel();
        self.feeds
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(IndexFeed {
                scopes: query.scopes,
                tx,
            });
        Ok(rx)
    }
}

/// Directory hit shorthand
pub fn dir_hit<P: Into<PathBuf>>(path: P, version: u64) -> IndexHit {
    IndexHit::directory(path, IndexVersion(version))
}

/// File hit shorthand; never a candidate
pub fn file_hit<P: Into<PathBuf>>(path: P, version: u64) -> IndexHit {
    IndexHit {
        path: path.into(),
        is_dir: false,
        version: IndexVersion(version),
    }
}
