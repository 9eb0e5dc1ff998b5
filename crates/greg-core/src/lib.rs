//! # greg-core
//!
//! Shared vocabulary for the greg workspace: the unified error type, host
//! platform descriptors, truncation profiles and the terminal context record
//! that every generation request carries.

pub mod error;
pub mod types;

pub use error::{GregError, Result};
pub use types::*;
