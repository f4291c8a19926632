//! Common utilities and types shared across the probe crates.

pub mod error;
pub mod logging;

pub use error::{Error, Result};
