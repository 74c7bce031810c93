//! Error types for the logger system

pub type Result<T> = std::result::Result<T, LoggerError>;

#[derive(Debug, thiserror::Error)]
pub enum LoggerError {
    /// Severity value outside of `[None, Debug]`
    #[error("invalid severity")]
    InvalidSeverity,

    /// Severity text that does not name a severity
    #[error("unknown severity: '{0}'")]
    UnknownSeverity(String),

    /// Generic IO error
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// Writing a formatted log to the output's writer failed
    #[error("{output} output failed to write log: {source}")]
    WriteFailed {
        output: String,
        #[source]
        source: std::io::Error,
    },

    /// Strftime layout that chrono cannot render
    #[error("invalid time layout: '{0}'")]
    InvalidTimeLayout(String),

    /// A wait ran past its deadline
    #[error("deadline exceeded")]
    DeadlineExceeded,

    /// A wait was cancelled by its caller
    #[error("operation cancelled")]
    Cancelled,

    /// Queued output worker thread panicked
    #[error("queued output worker panicked: {0}")]
    WorkerPanicked(String),
}

impl LoggerError {
    /// Create a write error for the named output
    pub fn write_failed(output: impl Into<String>, source: std::io::Error) -> Self {
        LoggerError::WriteFailed {
            output: output.into(),
            source,
        }
    }

    /// Create a worker panic error from a panic payload
    pub fn worker_panicked(payload: &(dyn std::any::Any + Send)) -> Self {
        let message = if let Some(s) = payload.downcast_ref::<&str>() {
            s.to_string()
        } else if let Some(s) = payload.downcast_ref::<String>() {
            s.clone()
        } else {
            "Unknown panic".to_string()
        };
        LoggerError::WorkerPanicked(message)
    }

    /// Whether this error reports an expired deadline or a cancellation
    #[must_use]
    pub fn is_context_error(&self) -> bool {
        matches!(self, LoggerError::DeadlineExceeded | LoggerError::Cancelled)
    }
}

/// Walks the source chain of `err` looking for a cancellation or deadline error.
///
/// Recognizes [`LoggerError::Cancelled`], [`LoggerError::DeadlineExceeded`] and
/// IO errors of kind `TimedOut`.
pub fn is_context_error(err: &(dyn std::error::Error + 'static)) -> bool {
    let mut current = Some(err);
    while let Some(e) = current {
        if let Some(le) = e.downcast_ref::<LoggerError>() {
            if le.is_context_error() {
                return true;
            }
        }
        if let Some(io) = e.downcast_ref::<std::io::Error>() {
            if io.kind() == std::io::ErrorKind::TimedOut {
                return true;
            }
        }
        current = e.source();
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, thiserror::Error)]
    #[error("flush failed")]
    struct Wrapped(#[source] LoggerError);

    #[test]
    fn test_error_display() {
        assert_eq!(LoggerError::InvalidSeverity.to_string(), "invalid severity");
        assert_eq!(
            LoggerError::UnknownSeverity("LOUD".to_string()).to_string(),
            "unknown severity: 'LOUD'"
        );

        let io_err = std::io::Error::new(std::io::ErrorKind::BrokenPipe, "pipe closed");
        let err = LoggerError::write_failed("text", io_err);
        assert_eq!(err.to_string(), "text output failed to write log: pipe closed");
    }

    #[test]
    fn test_context_error_detection() {
        assert!(is_context_error(&LoggerError::Cancelled));
        assert!(is_context_error(&LoggerError::DeadlineExceeded));
        assert!(!is_context_error(&LoggerError::InvalidSeverity));

        let wrapped = Wrapped(LoggerError::DeadlineExceeded);
        assert!(is_context_error(&wrapped));

        let timed_out = std::io::Error::new(std::io::ErrorKind::TimedOut, "slow");
        assert!(is_context_error(&timed_out));
    }

    #[test]
    fn test_worker_panicked_payload() {
        let payload: Box<dyn std::any::Any + Send> = Box::new("boom");
        let err = LoggerError::worker_panicked(payload.as_ref());
        assert!(matches!(err, LoggerError::WorkerPanicked(ref m) if m == "boom"));
    }
}
