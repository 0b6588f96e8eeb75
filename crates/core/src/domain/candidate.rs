use serde::{Deserialize, Serialize};
use std::path::{Component, Path, PathBuf};

/// Identity of a repository candidate: its normalized absolute path
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RepoId(pub PathBuf);

impl RepoId {
    pub fn from_path(path: &Path) -> Self {
        Self(normalize_path(path))
    }

    pub fn as_path(&self) -> &Path {
        &self.0
    }
}

impl std::fmt::Display for RepoId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.display())
    }
}

/// Opaque metadata version reported by the index for an entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct IndexVersion(pub u64);

/// A directory believed to be a repository root
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositoryCandidate {
    pub id: RepoId,
    pub path: PathBuf,
    pub name: String,
    pub version: IndexVersion,
}

impl RepositoryCandidate {
    pub fn new(path: &Path, version: IndexVersion) -> Self {
        let id = RepoId::from_path(path);
        let name = id
            .as_path()
            .file_name()
            .unwrap_or_default()
            .to_string_lossy()
            .to_string();

        Self {
            path: id.0.clone(),
            id,
            name,
            version,
        }
    }
}

impl std::fmt::Display for RepositoryCandidate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.name, self.path.display())
    }
}

/// Lexically normalize a path into an absolute one.
///
/// Never touches the filesystem, so paths of deleted directories still
/// normalize to the identity they had while they existed.
pub fn normalize_path(path: &Path) -> PathBuf {
    let joined;
    let path = if path.is_relative() {
        match std::env::current_dir() {
            Ok(cwd) => {
                joined = cwd.join(path);
                joined.as_path()
            }
            Err(_) => path,
        }
    } else {
        path
    };

    let mut normalized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                // Never pop past the root
                if normalized.file_name().is_some() {
                    normalized.pop();
                }
            }
            other => normalized.push(other.as_os_str()),
        }
    }
    normalized
}
