use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// A filesystem region a search is restricted to
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SearchScope {
    /// An absolute directory path
    Directory(PathBuf),

    /// The mount point of a logical volume
    Volume(PathBuf),

    /// Every indexed local volume; the index decides what that covers
    LocalComputer,
}

impl SearchScope {
    pub fn directory<P: Into<PathBuf>>(path: P) -> Self {
        Self::Directory(path.into())
    }

    pub fn volume<P: Into<PathBuf>>(mount_point: P) -> Self {
        Self::Volume(mount_point.into())
    }

    /// The concrete path, if the scope names one
    pub fn path(&self) -> Option<&Path> {
        match self {
            Self::Directory(path) | Self::Volume(path) => Some(path),
            Self::LocalComputer => None,
        }
    }
}

impl fmt::Display for SearchScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Directory(path) => write!(f, "{}", path.display()),
            Self::Volume(path) => write!(f, "volume {}", path.display()),
            Self::LocalComputer => write!(f, "local computer"),
        }
    }
}
