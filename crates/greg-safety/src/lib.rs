//! # greg-safety
//!
//! Decides whether a generated shell command needs explicit confirmation
//! before it runs.
//!
//! This is best-effort pattern matching over the command text. It is **not**
//! a security boundary: aliases, functions, obfuscation (`r""m`, `$(echo rm)`)
//! or tools that are simply not listed all pass through unflagged. Treat a
//! `false` result as "nothing obvious", never as "safe".

pub mod classifier;

pub use classifier::{is_dangerous, DangerCategory, DangerClassifier, DangerRule};
