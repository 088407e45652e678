// All core functionality is in boletin-core
// This CLI acts as a thin wrapper around the core library

// CLI-specific modules
pub mod fetch;

// Re-export core types for convenience
pub use boletin_core::*;

// Re-export CLI utilities
pub use fetch::NewsletterFetcher;
