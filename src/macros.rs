//! Logging macros for ergonomic log message formatting.
//!
//! These macros take a logger followed by `format!`-style arguments and expand to the
//! logger's `*f` methods, so arguments are only formatted once the log passed the
//! severity and verbosity gates.
//!
//! # Examples
//!
//! ```
//! use logng::prelude::*;
//! use logng::info;
//! use std::sync::Arc;
//!
//! let output = Arc::new(TextOutput::new(std::io::stdout(), TextOutputFlags::SEVERITY));
//! let logger = Logger::new(output, Severity::Info, 0);
//!
//! info!(logger, "Server started");
//!
//! let port = 8080;
//! info!(logger, "Server listening on port {}", port);
//! ```

/// Log a message at the given severity.
///
/// # Examples
///
/// ```
/// # use logng::prelude::*;
/// # let logger = Logger::default();
/// use logng::log;
/// log!(logger, Severity::Info, "Simple message");
/// log!(logger, Severity::Error, "Error code: {}", 500);
/// ```
#[macro_export]
macro_rules! log {
    ($logger:expr, $severity:expr, $($arg:tt)+) => {
        $logger.logf($severity, format_args!($($arg)+))
    };
}

/// Log a fatal message, then exit the process with status 1.
///
/// # Examples
///
/// ```no_run
/// # use logng::prelude::*;
/// # let logger = Logger::default();
/// use logng::fatal;
/// fatal!(logger, "Unable to recover from error: {}", "disk full");
/// ```
#[macro_export]
macro_rules! fatal {
    ($logger:expr, $($arg:tt)+) => {
        $logger.fatalf(format_args!($($arg)+))
    };
}

/// Log an error message.
///
/// # Examples
///
/// ```
/// # use logng::prelude::*;
/// # let logger = Logger::default();
/// use logng::error;
/// error!(logger, "Failed to connect to database");
/// error!(logger, "Error code: {}, message: {}", 500, "Internal error");
/// ```
#[macro_export]
macro_rules! error {
    ($logger:expr, $($arg:tt)+) => {
        $logger.errorf(format_args!($($arg)+))
    };
}

/// Log a warning message.
///
/// # Examples
///
/// ```
/// # use logng::prelude::*;
/// # let logger = Logger::default();
/// use logng::warning;
/// warning!(logger, "Retry attempt {} of {}", 3, 5);
/// ```
#[macro_export]
macro_rules! warning {
    ($logger:expr, $($arg:tt)+) => {
        $logger.warningf(format_args!($($arg)+))
    };
}

/// Log an info message.
///
/// # Examples
///
/// ```
/// # use logng::prelude::*;
/// # let logger = Logger::default();
/// use logng::info;
/// info!(logger, "Processing {} items", 100);
/// ```
#[macro_export]
macro_rules! info {
    ($logger:expr, $($arg:tt)+) => {
        $logger.infof(format_args!($($arg)+))
    };
}

/// Log a debug message.
///
/// # Examples
///
/// ```
/// # use logng::prelude::*;
/// # let logger = Logger::default();
/// use logng::debug;
/// debug!(logger, "Counter value: {}", 10);
/// ```
#[macro_export]
macro_rules! debug {
    ($logger:expr, $($arg:tt)+) => {
        $logger.debugf(format_args!($($arg)+))
    };
}

#[cfg(test)]
mod tests {
    use crate::core::{Log, Logger, Output, Severity};
    use parking_lot::Mutex;
    use std::sync::Arc;

    #[derive(Default)]
    struct Capture(Mutex<Vec<(Severity, String)>>);

    impl Output for Capture {
        fn log(&self, log: Log) {
            self.0.lock().push((log.severity, log.message));
        }
    }

    fn logger() -> (Arc<Capture>, Logger) {
        let capture = Arc::new(Capture::default());
        let logger = Logger::new(capture.clone(), Severity::Debug, 0);
        (capture, logger)
    }

    #[test]
    fn test_log_macro() {
        let (capture, logger) = logger();
        log!(logger, Severity::Warning, "Test message");
        log!(logger, Severity::Info, "Formatted: {}", 42);
        assert_eq!(
            *capture.0.lock(),
            [
                (Severity::Warning, "Test message".to_string()),
                (Severity::Info, "Formatted: 42".to_string()),
            ]
        );
    }

    #[test]
    fn test_leveled_macros() {
        let (capture, logger) = logger();
        error!(logger, "Error {}", 1);
        warning!(logger, "Warning {}", 2);
        info!(logger, "Info {}", 3);
        debug!(logger, "Debug {}", 4);
        let severities: Vec<Severity> = capture.0.lock().iter().map(|(s, _)| *s).collect();
        assert_eq!(
            severities,
            [Severity::Error, Severity::Warning, Severity::Info, Severity::Debug]
        );
        assert_eq!(capture.0.lock()[3].1, "Debug 4");
    }

    #[test]
    fn test_macros_on_derived_logger() {
        let (capture, logger) = logger();
        info!(logger.with_prefix("[db] "), "connected to {}", "primary");
        info!(logger.v(1), "never emitted");
        assert_eq!(capture.0.lock()[0].1, "[db] connected to primary");
        assert_eq!(capture.0.lock().len(), 1);
    }
}
