//! # greg-cli
//!
//! Command-line interface for greg.
//!
//! ## Usage
//!
//! - `greg <request…>`: generate a shell command, confirm if risky, run it
//! - `greg`: write a script in `$EDITOR` and run it
//! - `greg --chat`: interactive streaming session
//! - `greg --setup`: choose a provider and store credentials
//! - `greg --skills [list|add <name>|edit <name>|path]`: manage skills

pub mod commands;
pub mod ui;

pub use commands::Cli;
