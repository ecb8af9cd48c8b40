//! # Badger Common Library
//!
//! Shared code for the badger badge proxy:
//! - Error types
//! - TOML configuration model and loading
//! - Configuration file resolution

pub mod config;
pub mod error;

pub use config::TomlConfig;
pub use error::{Error, Result};
