//! # greg-config
//!
//! Configuration for greg. Reads `config.json` from the per-user config
//! directory, falls back to environment variables for API keys, and owns the
//! [`Paths`] value that tells every other component where its files live.

pub mod loader;
pub mod paths;
pub mod schema;

pub use loader::ConfigLoader;
pub use paths::Paths;
pub use schema::{ConfigWarning, GregConfig, ProviderKind, WarningSeverity};
