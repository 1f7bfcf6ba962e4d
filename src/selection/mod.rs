pub mod selector;

pub use selector::{group_score, rng_from_seed, GroupSelector, SearchResult, SelectionError};
