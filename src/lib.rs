//! # logng
//!
//! Leveled and structured logging with text and JSON outputs.
//!
//! ## Features
//!
//! - **Severity and verbosity gates**: logs below the logger's thresholds cost no formatting
//! - **Derived loggers**: prefixes, suffixes, fields and pinned times without touching the parent
//! - **Caller capture**: every log knows its call site, and optionally the full stack
//! - **Queued output**: a bounded queue and worker thread in front of any output
//!
//! ## Example
//!
//! ```
//! use logng::prelude::*;
//! use std::sync::Arc;
//!
//! let output = Arc::new(TextOutput::new(std::io::stdout(), TextOutputFlags::DEFAULT));
//! let logger = Logger::new(output, Severity::Info, 1);
//!
//! logger.info("server started");
//! logger
//!     .with_field_key_vals(["port", "8080"])
//!     .v(1)
//!     .infof(format_args!("listening on {}", 8080));
//! ```

pub mod core;
pub mod default;
pub mod macros;
pub mod outputs;

pub mod prelude {
    pub use crate::core::{
        Field, FieldValue, Fields, Log, Logger, LoggerBuilder, LoggerError, Output, Result,
        Severity, StackCaller, StackFormat, StackTrace, TimestampFormat, Verbose,
    };
    pub use crate::outputs::{
        JsonOutput, JsonOutputFlags, MultiOutput, QueueState, QueuedOutput, TextOutput,
        TextOutputFlags,
    };
}

pub use crate::core::{
    is_context_error, program_counters, ErrorCallback, Field, FieldValue, Fields, Log, LogError,
    Logger, LoggerBuilder, LoggerError, Output, QueueFullCallback, QueueMetrics, Result, Severity,
    StackCaller, StackFormat, StackTrace, TimestampFormat, Verbose, DEFAULT_MAX_STACK_FRAMES,
};
pub use default::{default_logger, default_text_output, reset};
pub use outputs::{
    JsonOutput, JsonOutputFlags, MultiOutput, QueueState, QueuedOutput, TextOutput,
    TextOutputFlags,
};
