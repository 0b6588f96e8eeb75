pub mod discovery;
pub mod git;

pub use discovery::{DiscoveryOptions, FsDiscoveryAdapter};
pub use git::git_repository_matcher;
