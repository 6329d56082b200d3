//! Logging utilities with colored output.
//!
//! This module provides:
//! - `log!` macro for formatted diagnostic output with colored prefixes
//! - `debug!` macro for lines only shown with `--verbose`
//! - `verdict` for the final pass/fail line of a run
//!
//! Everything is written to stderr: the pipeline's real output lives on disk,
//! and the diagnostic stream is where failures are reported.
//!
//! # Example
//!
//! ```ignore
//! log!("extract"; "{}: {} entries", provider.id, count);
//! debug!("canonical"; "{} -> {}", raw, name);
//! ```

use owo_colors::OwoColorize;
use std::{
    io::{Write, stderr},
    sync::atomic::{AtomicBool, Ordering},
};

/// Global verbose flag (set by --verbose CLI argument)
static VERBOSE: AtomicBool = AtomicBool::new(false);

/// Set verbose mode globally
pub fn set_verbose(v: bool) {
    VERBOSE.store(v, Ordering::SeqCst);
}

/// Check if verbose mode is enabled
pub fn is_verbose() -> bool {
    VERBOSE.load(Ordering::SeqCst)
}

// ============================================================================
// Log Macro
// ============================================================================

/// Log a message with a colored module prefix
///
/// # Usage
/// ```ignore
/// log!("module"; "message with {} formatting", args);
/// ```
#[macro_export]
macro_rules! log {
    ($module:expr; $($arg:tt)*) => {{
        $crate::logger::log($module, &format!($($arg)*))
    }};
}

/// Log a debug message (only shown when --verbose is enabled)
///
/// # Usage
/// ```ignore
/// debug!("module"; "debug info: {}", value);
/// ```
#[macro_export]
macro_rules! debug {
    ($module:expr; $($arg:tt)*) => {{
        if $crate::logger::is_verbose() {
            $crate::logger::log($module, &format!($($arg)*))
        }
    }};
}

// ============================================================================
// Helper Functions
// ============================================================================

/// Log a message with a colored module prefix
///
/// The stderr lock is held for the whole line so parallel provider
/// branches never interleave partial lines.
#[inline]
pub fn log(module: &str, message: &str) {
    let module_lower = module.to_ascii_lowercase();
    let prefix = colorize_prefix(module, &module_lower);

    let mut stderr = stderr().lock();
    writeln!(stderr, "{prefix} {message}").ok();
    stderr.flush().ok();
}

/// Apply color to a module prefix based on module type
#[inline]
fn colorize_prefix(module: &str, module_lower: &str) -> String {
    let prefix = format!("[{module}]");
    match module_lower {
        "extract" => prefix.bright_blue().bold().to_string(),
        "catalog" => prefix.bright_green().bold().to_string(),
        "error" | "failed" => prefix.bright_red().bold().to_string(),
        "skip" | "warning" => prefix.bright_magenta().bold().to_string(),
        _ => prefix.bright_yellow().bold().to_string(),
    }
}

/// Print the final verdict of a run.
pub fn verdict(passed: bool, detail: &str) {
    let mut stderr = stderr().lock();
    if passed {
        writeln!(stderr, "{} {}", "✓ pass".green().bold(), detail).ok();
    } else {
        writeln!(stderr, "{} {}", "✗ fail".red().bold(), detail).ok();
    }
    stderr.flush().ok();
}

// ============================================================================
// Tests
// ============================================================================
