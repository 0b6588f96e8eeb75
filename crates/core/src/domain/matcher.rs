use std::fmt;
use std::path::Path;
use std::sync::Arc;

/// Metadata directory the default matcher looks for
pub const GIT_MARKER: &str = ".git";

/// Injectable predicate deciding whether a directory is a repository root.
///
/// Cheap to clone and safe to share with index worker threads.
#[derive(Clone)]
pub struct RepositoryMatcher {
    predicate: Arc<dyn Fn(&Path) -> bool + Send + Sync>,
    description: String,
}

impl RepositoryMatcher {
    pub fn new<F>(predicate: F) -> Self
    where
        F: Fn(&Path) -> bool + Send + Sync + 'static,
    {
        Self {
            predicate: Arc::new(predicate),
            description: "custom".to_string(),
        }
    }

    /// Matches directories containing any of the given metadata directories
    pub fn with_markers<I, S>(markers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let markers: Vec<String> = markers.into_iter().map(Into::into).collect();
        let description = format!("markers {}", markers.join(", "));

        Self {
            predicate: Arc::new(move |path: &Path| {
                markers.iter().any(|marker| path.join(marker).is_dir())
            }),
            description,
        }
    }

    pub fn described<S: Into<String>>(mut self, description: S) -> Self {
        self.description = description.into();
        self
    }

    pub fn matches(&self, path: &Path) -> bool {
        (self.predicate)(path)
    }

    pub fn description(&self) -> &str {
        &self.description
    }
}

impl Default for RepositoryMatcher {
    fn default() -> Self {
        default_repository_matcher()
    }
}

impl fmt::Debug for RepositoryMatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RepositoryMatcher")
            .field("description", &self.description)
            .finish()
    }
}

/// A directory is a repository when it holds a `.git` directory
pub fn default_repository_matcher() -> RepositoryMatcher {
    RepositoryMatcher::with_markers([GIT_MARKER])
}
