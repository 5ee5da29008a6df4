//! Presentation layer for conclave
//!
//! This crate contains the CLI definition, output formatters and progress
//! reporters.

pub mod cli;
pub mod output;
pub mod progress;

// Re-export commonly used types
pub use cli::commands::{
    Cli, CollaborateArgs, Command, HistoryArgs, ModeArg, OutputArg, ProcessArgs, QueryArgs,
    StatusArgs,
};
pub use output::console::ConsoleFormatter;
pub use progress::reporter::ProgressReporter;
