pub mod index;
pub mod observer;

// Re-exports
pub use index::*;
pub use observer::*;
