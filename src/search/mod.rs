pub mod executor;
pub mod heuristics;
pub mod rank;
pub mod stopwords;

pub use executor::{search, GrepMatch, SearchMode};
pub use rank::{rank, RankedMatch};
