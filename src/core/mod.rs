//! Core logger types and traits

pub mod error;
pub mod field;
pub mod log;
pub mod logger;
pub mod metrics;
pub mod output;
pub mod severity;
pub mod stack;
pub mod timestamp;

pub use error::{is_context_error, LoggerError, Result};
pub use field::{Field, FieldValue, Fields};
pub use log::{Log, LogError};
pub use logger::{Logger, LoggerBuilder};
pub use metrics::QueueMetrics;
pub use output::{ErrorCallback, Output, QueueFullCallback};
pub use severity::{Severity, Verbose};
pub use stack::{program_counters, StackCaller, StackFormat, StackTrace, DEFAULT_MAX_STACK_FRAMES};
pub use timestamp::TimestampFormat;
