pub mod classifier;
pub mod config;
pub mod handlers;
pub mod labels;
pub mod metrics;
pub mod models;
pub mod pipeline;
pub mod processing;

// Convenient re-exports for tests and external callers
pub use classifier::*;
pub use config::*;
pub use labels::*;
pub use models::*;
pub use pipeline::*;
