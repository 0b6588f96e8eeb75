//! repofinder application library
//!
//! Wires the core search domain to the filesystem: the walkdir-backed index
//! adapter, the git2 matcher, configuration, and the repository finder
//! service that drives a search and notifies its observer.

pub mod adapters;
pub mod cli;
pub mod config;
pub mod services;

pub use services::RepositoryFinder;
