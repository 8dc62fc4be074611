//! Shared error definitions and file helpers used across all switchyard crates.

pub mod error;
pub mod json_file;

pub use error::{Error, FromMessage, Result};
