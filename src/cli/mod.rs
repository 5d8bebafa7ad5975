//! Command-line interface components
//!
//! Argument parsing, the run handler and the batch progress bar.

pub mod args;
pub mod commands;
pub mod progress;

pub use args::Cli;
pub use commands::{handle_run, load_run_config};
pub use progress::{batch_progress_bar, ProgressConfig};
