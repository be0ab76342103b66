//! Spotify Favorites Sync Library
//!
//! This library makes sure that every track of every album saved in a user's
//! Spotify library is also saved as a liked track. It walks the paged album
//! listing, expands each album into its track IDs, subtracts a user maintained
//! skiplist and likes whatever is missing in API sized batches.
//!
//! # Modules
//!
//! - `api` - HTTP API endpoints for the local OAuth callback server
//! - `cli` - Command-line interface implementations
//! - `config` - Configuration management and environment variables
//! - `error` - The error type shared by the sync core and the Spotify client
//! - `management` - Token persistence
//! - `retry` - Bounded retry with exponential backoff
//! - `server` - Local HTTP server for OAuth callbacks
//! - `spotify` - Spotify Web API client implementation
//! - `sync` - Pagination, skiplist loading, track resolution and batching
//! - `types` - Data structures and type definitions
//! - `utils` - Utility functions and helpers

use std::sync::atomic::{AtomicU8, Ordering};

pub mod api;
pub mod cli;
pub mod config;
pub mod error;
pub mod management;
pub mod retry;
pub mod server;
pub mod spotify;
pub mod sync;
pub mod types;
pub mod utils;

pub use error::SyncError;

static VERBOSITY: AtomicU8 = AtomicU8::new(0);

/// Sets the console verbosity. 0 = normal, 1 = debug, 2 or more = trace.
pub fn set_verbosity(level: u8) {
    VERBOSITY.store(level, Ordering::Relaxed);
}

pub fn verbosity() -> u8 {
    VERBOSITY.load(Ordering::Relaxed)
}

/// Prints an informational message with a blue bullet point.
///
/// # Example
///
/// ```
/// info!("Found {} saved albums", count);
/// ```
#[macro_export]
macro_rules! info {
  ($($arg:tt)*) => ({
    use colored::Colorize;
    println!("[{}] {}", "o".blue().bold(), std::format_args!($($arg)*));
  })
}

/// Prints a success message with a green checkmark.
#[macro_export]
macro_rules! success {
  ($($arg:tt)*) => ({
    use colored::Colorize;
    println!("[{}] {}", "✓".green().bold(), std::format_args!($($arg)*));
  })
}

/// Prints an error message with a red exclamation mark and exits the program.
///
/// Only for fatal errors. Code after this macro does not run.
#[macro_export]
macro_rules! error {
  ($($arg:tt)*) => ({
    use colored::Colorize;
    eprintln!("[{}] {}", "!".red().bold(), std::format_args!($($arg)*));
    std::process::exit(1);
  })
}

/// Prints a warning message with a yellow exclamation mark.
#[macro_export]
macro_rules! warning {
  ($($arg:tt)*) => ({
    use colored::Colorize;
    println!("[{}] {}", "!".yellow().bold(), std::format_args!($($arg)*));
  })
}

/// Prints a dimmed message when the verbosity is at least 1 (`-v`).
#[macro_export]
macro_rules! debug {
  ($($arg:tt)*) => ({
    if $crate::verbosity() >= 1 {
      use colored::Colorize;
      println!("[{}] {}", "d".dimmed(), std::format_args!($($arg)*));
    }
  })
}

/// Prints a dimmed message when the verbosity is at least 2 (`-vv`).
#[macro_export]
macro_rules! trace {
  ($($arg:tt)*) => ({
    if $crate::verbosity() >= 2 {
      use colored::Colorize;
      println!("[{}] {}", "t".dimmed(), std::format_args!($($arg)*));
    }
  })
}
