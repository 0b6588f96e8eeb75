pub mod finder;

pub use finder::RepositoryFinder;
