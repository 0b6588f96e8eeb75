pub mod candidate;
pub mod events;
pub mod matcher;
pub mod result_set;
pub mod scope;

// Re-exports for convenience
pub use candidate::*;
pub use events::*;
pub use matcher::*;
pub use result_set::*;
pub use scope::*;
