//! Log record handed from a logger to its output

use super::field::Fields;
use super::severity::{Severity, Verbose};
use super::stack::{StackCaller, StackTrace};
use chrono::{DateTime, Utc};
use std::error::Error;
use std::sync::Arc;

/// Error attached to a log
pub type LogError = Arc<dyn Error + Send + Sync + 'static>;

/// One emitted log.
///
/// `message` already carries the logger's prefix and suffix, without a trailing newline.
/// `stack_trace` is only present when the logger's stack trace severity covered this log.
#[derive(Debug, Clone)]
pub struct Log {
    pub message: String,
    pub error: Option<LogError>,
    pub severity: Severity,
    pub verbosity: Verbose,
    pub time: DateTime<Utc>,
    pub fields: Fields,
    pub caller: StackCaller,
    pub stack_trace: Option<StackTrace>,
}

impl Log {
    pub fn new(severity: Severity, message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            error: None,
            severity,
            verbosity: 0,
            time: Utc::now(),
            fields: Fields::new(),
            caller: StackCaller::default(),
            stack_trace: None,
        }
    }

    #[must_use]
    pub fn with_time(mut self, time: DateTime<Utc>) -> Self {
        self.time = time;
        self
    }

    #[must_use]
    pub fn with_fields(mut self, fields: Fields) -> Self {
        self.fields = fields;
        self
    }

    #[must_use]
    pub fn with_caller(mut self, caller: StackCaller) -> Self {
        self.caller = caller;
        self
    }

    #[must_use]
    pub fn with_stack_trace(mut self, stack_trace: StackTrace) -> Self {
        self.stack_trace = Some(stack_trace);
        self
    }

    #[must_use]
    pub fn with_error(mut self, error: LogError) -> Self {
        self.error = Some(error);
        self
    }
}
