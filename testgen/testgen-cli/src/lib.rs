//! Testgen CLI library: command implementations and output helpers.

pub mod commands;
pub mod output;

pub use output::OutputFormat;
