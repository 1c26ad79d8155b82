//! CLI module
//!
//! Command-line interface for running a source definition.
//!
//! # Commands
//!
//! - `fetch` - Fetch rows up to the row cap
//! - `check` - Fetch a single row to test the source
//! - `validate` - Validate the definition
//! - `show` - Print the resolved definition

mod commands;
mod runner;

pub use commands::{Cli, Commands, OutputFormat};
pub use runner::{render_rows, Runner};
