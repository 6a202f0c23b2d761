//! Transports that drive the workflow.
//!
//! The HTTP transport lives with the workflow in `brand::routes`; this module
//! holds the interactive terminal one.

pub mod cli;

pub use cli::{CliChannel, CLI_IDENTITY};
