pub mod discovery;

// Re-exports
pub use discovery::*;
