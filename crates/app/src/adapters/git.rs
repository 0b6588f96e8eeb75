use git2::{Repository, RepositoryOpenFlags};
use repofinder_core::domain::RepositoryMatcher;
use std::ffi::OsStr;
use std::path::Path;

/// Matcher that only accepts directories git2 can open as a repository.
///
/// Stricter than the marker check: a stray or corrupt `.git` directory is
/// rejected, while bare repositories are accepted.
pub fn git_repository_matcher() -> RepositoryMatcher {
    RepositoryMatcher::new(is_git_repository).described("git repository")
}

pub fn is_git_repository(path: &Path) -> bool {
    // NO_SEARCH keeps subdirectories of a repository from matching
    Repository::open_ext(path, RepositoryOpenFlags::NO_SEARCH, std::iter::empty::<&OsStr>()).is_ok()
}
