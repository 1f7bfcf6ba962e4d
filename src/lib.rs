// Core modules
pub mod config;
pub mod data;
pub mod models;
pub mod report;
pub mod selection;
pub mod stats;

// Re-export commonly used types
pub use crate::config::AppConfig;
pub use models::*;
pub use selection::{GroupSelector, SearchResult, SelectionError};
pub use stats::{CorrelationMatrix, MatrixError, ReturnTable};
