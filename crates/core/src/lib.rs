//! repofinder core - repository search domain with no filesystem walking
//!
//! This crate holds the domain types, the error taxonomy, the ports
//! (the metadata index and the finder observer) and the scoped index search
//! that normalizes raw index updates into candidate batches. Concrete index
//! implementations live in adapters.

pub mod domain;
pub mod error;
pub mod ports;
pub mod search;

#[cfg(any(test, feature = "test-support"))]
pub mod testing;

// Re-exports for ergonomics
pub use domain::*;
pub use error::*;
pub use search::ScopeIndexSearch;
