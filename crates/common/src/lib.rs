//! Shared error helpers and key-path utilities used across all plinth crates.

pub mod error;
pub mod key_path;

pub use error::{Error, FromMessage, Result};
