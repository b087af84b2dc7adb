//! Core types for the testgen test-scaffold generator.
//!
//! This crate provides the error taxonomy and configuration shared by the
//! Go analysis crate and the command-line front end.

pub mod config;
pub mod error;

pub use config::{GeneralConfig, ImportsConfig, TestgenConfig};
pub use error::{ErrorKind, Result, TestgenError};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::config::TestgenConfig;
    pub use crate::error::{ErrorKind, Result, TestgenError};
}
