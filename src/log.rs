//! Logging module for the enclave KMS library
//!
//! Detailed failure causes are logged, not returned: operations report a
//! coarse error code while the cause lands here. By default logging is
//! disabled and uses a no-op implementation; install a logger with
//! [`set_logger`]. Per-operation info lines are additionally gated by the
//! context's `enable_logging` flag.

use std::fmt;
use std::sync::RwLock;

/// Logger interface for the enclave KMS library
pub trait Logger: Send + Sync {
    /// Log an informational message
    fn info(&self, message: &str);

    /// Log an error message
    fn error(&self, message: &str);

    /// Log a formatted informational message
    fn infof(&self, fmt: fmt::Arguments<'_>);
}

/// A no-op logger that does nothing
#[derive(Debug, Default)]
pub struct NoopLogger;

impl NoopLogger {
    /// Create a new no-op logger
    pub fn new() -> Self {
        Self
    }

    /// Create a boxed instance
    pub fn boxed() -> Box<dyn Logger> {
        Box::new(Self::new())
    }
}

impl Logger for NoopLogger {
    fn info(&self, _message: &str) {}
    fn error(&self, _message: &str) {}
    fn infof(&self, _fmt: fmt::Arguments<'_>) {}
}

// Global logger (default to noop)
static LOGGER: RwLock<Option<Box<dyn Logger>>> = RwLock::new(None);

/// Set the logger for the enclave KMS library
pub fn set_logger(logger: Box<dyn Logger>) {
    let mut global_logger = LOGGER.write().unwrap_or_else(|e| e.into_inner());
    *global_logger = Some(logger);
}

/// Check if a logger is installed
pub fn logging_enabled() -> bool {
    let global_logger = LOGGER.read().unwrap_or_else(|e| e.into_inner());
    global_logger.is_some()
}

/// Log an informational message
pub fn info(message: &str) {
    let global_logger = LOGGER.read().unwrap_or_else(|e| e.into_inner());
    if let Some(logger) = global_logger.as_ref() {
        logger.info(message);
    }
}

/// Log an error message
pub fn error(message: &str) {
    let global_logger = LOGGER.read().unwrap_or_else(|e| e.into_inner());
    if let Some(logger) = global_logger.as_ref() {
        logger.error(message);
    }
}

/// Log a formatted informational message
pub fn infof(args: fmt::Arguments<'_>) {
    let global_logger = LOGGER.read().unwrap_or_else(|e| e.into_inner());
    if let Some(logger) = global_logger.as_ref() {
        logger.infof(args);
    }
}

/// Macro for logging a formatted informational message
#[macro_export]
macro_rules! infof {
    ($($arg:tt)*) => {
        $crate::log::infof(format_args!($($arg)*))
    };
}

/// A logger that writes to standard error, matching the enclave convention
/// of keeping stdout free for the host protocol
#[derive(Debug, Default)]
pub struct StderrLogger;

impl StderrLogger {
    /// Create a new stderr logger
    pub fn new() -> Self {
        Self
    }

    /// Create a boxed instance
    pub fn boxed() -> Box<dyn Logger> {
        Box::new(Self::new())
    }
}

impl Logger for StderrLogger {
    fn info(&self, message: &str) {
        eprintln!("enclavekms info: {}", message);
    }

    fn error(&self, message: &str) {
        eprintln!("enclavekms error: {}", message);
    }

    fn infof(&self, args: fmt::Arguments<'_>) {
        eprintln!("enclavekms info: {}", args);
    }
}
