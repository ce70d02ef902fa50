// Core modules
pub mod api;
pub mod engine;
pub mod ingest;
pub mod models;
pub mod store;

// Re-export commonly used types
pub use api::*;
pub use models::*;
pub use store::{Projection, StateStore};

// Error handling
pub type Result<T> = std::result::Result<T, Box<dyn std::error::Error + Send + Sync>>;
