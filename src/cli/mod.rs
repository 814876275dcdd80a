//! Command-line interface

pub mod commands;
pub mod interactive;

pub use commands::{run_cli, Cli};
pub use interactive::InteractiveConsole;
