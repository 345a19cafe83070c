pub mod identity;
pub mod repository;
pub mod scope;

// Re-exports for convenience
pub use identity::*;
pub use repository::*;
pub use scope::*;
