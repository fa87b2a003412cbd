//! Configuration Management
//!
//! Settings are resolved once per process with this precedence:
//! 1. Built-in defaults
//! 2. Secrets file (chat only, .lograg/secrets.toml)
//! 3. Environment variables (highest priority)

mod loader;
mod types;

pub use loader::ConfigLoader;
pub use types::*;
