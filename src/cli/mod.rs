//! Command-line argument parsing, output formatting, and interrupt handling

pub mod args;
pub mod interrupt;
pub mod output;
