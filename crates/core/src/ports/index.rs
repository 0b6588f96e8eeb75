use crate::domain::{IndexVersion, RepositoryMatcher, SearchScope};
use crate::error::Result;
use std::path::PathBuf;
use tokio::sync::mpsc;

/// A raw entry reported by a metadata index
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexHit {
    pub path: PathBuf,
    pub is_dir: bool,
    pub version: IndexVersion,
}

impl IndexHit {
    pub fn directory<P: Into<PathBuf>>(path: P, version: IndexVersion) -> Self {
        Self {
            path: path.into(),
            is_dir: true,
            version,
        }
    }
}

/// Updates delivered by a registered live query, in delivery order
#[derive(Debug, Clone, PartialEq)]
pub enum IndexUpdate {
    /// Entries added or changed, and paths that are gone
    Batch {
        hits: Vec<IndexHit>,
        removed: Vec<PathBuf>,
    },

    /// Every currently indexed entry has been reported
    InitialScanComplete,

    /// One scope could not be queried; the others continue
    ScopeUnavailable { scope: SearchScope, reason: String },

    /// The index itself failed
    Unavailable { reason: String },
}

/// A scoped, predicate-filtered query to register with an index
#[derive(Debug, Clone)]
pub struct IndexQuery {
    pub scopes: Vec<SearchScope>,
    pub matcher: RepositoryMatcher,
}

/// Receiving side of a registered query.
///
/// Dropping or closing the stream cancels the query; producers watch
/// `UnboundedSender::is_closed` and stop delivering.
pub type IndexStream = mpsc::UnboundedReceiver<IndexUpdate>;

/// Port for the process-wide filesystem metadata index
pub trait MetadataIndex: Send + Sync {
    /// Register a live query and return its update stream.
    ///
    /// Must not block; scanning happens in the background. Only paths that
    /// satisfy `query.matcher` may be reported as hits; consumers do not
    /// re-check them.
    fn register(&self, query: IndexQuery) -> Result<IndexStream>;
}
