#![deny(missing_docs)]
//! Shared logging utilities for the bugbridge workspace.
//!
//! This crate provides the `bridge_*` logging macros used by the page and
//! background components, and a minimal test initializer for the global logger.
//! Every macro logs under the [`TARGET`] target so host applications can filter
//! bridge output independently of their own.

/// Log target used by all `bridge_*` macros.
pub const TARGET: &str = "bugbridge";

/// Logs a trace-level message under the bridge target.
#[macro_export]
macro_rules! bridge_trace {
    ($($arg:tt)*) => {{
        log::trace!(target: $crate::TARGET, $($arg)*);
    }};
}

/// Logs a debug-level message under the bridge target.
#[macro_export]
macro_rules! bridge_debug {
    ($($arg:tt)*) => {{
        log::debug!(target: $crate::TARGET, $($arg)*);
    }};
}

/// Logs an info-level message under the bridge target.
#[macro_export]
macro_rules! bridge_info {
    ($($arg:tt)*) => {{
        log::info!(target: $crate::TARGET, $($arg)*);
    }};
}

/// Logs a warn-level message under the bridge target.
#[macro_export]
macro_rules! bridge_warn {
    ($($arg:tt)*) => {{
        log::warn!(target: $crate::TARGET, $($arg)*);
    }};
}

/// Logs an error-level message under the bridge target.
#[macro_export]
macro_rules! bridge_error {
    ($($arg:tt)*) => {{
        log::error!(target: $crate::TARGET, $($arg)*);
    }};
}

/// Initializes a simple terminal logger for use in tests.
///
/// This safely no-ops if another logger has already been initialized.
pub fn initialize_for_tests() {
    use simplelog::{ColorChoice, CombinedLogger, ConfigBuilder, TermLogger, TerminalMode};

    let level = if cfg!(debug_assertions) {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };

    // Keep wiremock/hyper chatter out of test output.
    let config = ConfigBuilder::new()
        .add_filter_allow_str(TARGET)
        .build();

    // Ignore the error if a logger was already set by another test.
    let _ = CombinedLogger::init(vec![TermLogger::new(
        level,
        config,
        TerminalMode::Mixed,
        ColorChoice::Auto,
    )]);
}
