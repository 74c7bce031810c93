//! Leveled and structured logger
//!
//! A [`Logger`] gates logs by severity and verbosity, decorates them with its prefix,
//! suffix and fields, and hands the resulting [`Log`] to its [`Output`].
//!
//! Derivation methods (`with_*`, [`Logger::v`]) never touch the receiver: they return
//! an independent logger that shares only the output. Setters mutate in place under a
//! write lock and are meant for the few long-lived loggers, such as the default one.

use super::{
    error::is_context_error,
    field::{Field, FieldValue, Fields},
    log::{Log, LogError},
    output::Output,
    severity::{Severity, Verbose},
    stack::{StackCaller, StackTrace, DEFAULT_MAX_STACK_FRAMES},
};
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use std::error::Error;
use std::fmt::{self, Display, Write};
use std::panic::Location;
use std::sync::Arc;

#[derive(Clone)]
struct LoggerConfig {
    output: Option<Arc<dyn Output>>,
    severity: Severity,
    verbose: Verbose,
    print_severity: Severity,
    stack_trace_severity: Severity,
    max_stack_frames: usize,
    verbosity: Verbose,
    time: Option<DateTime<Utc>>,
    prefix: String,
    suffix: String,
    fields: Fields,
    ctx_err_verbosity: Verbose,
}

impl LoggerConfig {
    fn new(output: Option<Arc<dyn Output>>, severity: Severity, verbose: Verbose) -> Self {
        Self {
            output,
            severity,
            verbose,
            print_severity: Severity::Info,
            stack_trace_severity: Severity::None,
            max_stack_frames: DEFAULT_MAX_STACK_FRAMES,
            verbosity: 0,
            time: None,
            prefix: String::new(),
            suffix: String::new(),
            fields: Fields::new(),
            ctx_err_verbosity: 0,
        }
    }
}

/// Leveled, structured logger.
///
/// A logger without configuration (`inner == None`) is the null logger returned by
/// [`Logger::v`] when the requested verbosity is above the threshold: every method on
/// it is a no-op and every derivation of it is null again.
pub struct Logger {
    inner: Option<RwLock<LoggerConfig>>,
}

impl Logger {
    /// Creates a logger writing to `output`.
    #[must_use]
    pub fn new(output: Arc<dyn Output>, severity: Severity, verbose: Verbose) -> Self {
        Self::from_config(LoggerConfig::new(Some(output), severity, verbose))
    }

    /// Creates a logger without output; nothing is emitted until [`Logger::set_output`].
    #[must_use]
    pub fn without_output(severity: Severity, verbose: Verbose) -> Self {
        Self::from_config(LoggerConfig::new(None, severity, verbose))
    }

    /// The null logger
    #[must_use]
    pub const fn null() -> Self {
        Self { inner: None }
    }

    fn from_config(config: LoggerConfig) -> Self {
        Self {
            inner: Some(RwLock::new(config)),
        }
    }

    #[must_use]
    pub fn builder() -> LoggerBuilder {
        LoggerBuilder::new()
    }

    pub fn is_null(&self) -> bool {
        self.inner.is_none()
    }

    fn derive(&self, change: impl FnOnce(&mut LoggerConfig)) -> Logger {
        match &self.inner {
            Some(inner) => {
                let mut config = inner.read().clone();
                change(&mut config);
                Self::from_config(config)
            }
            None => Self::null(),
        }
    }

    fn update(&self, change: impl FnOnce(&mut LoggerConfig)) -> &Self {
        if let Some(inner) = &self.inner {
            change(&mut inner.write());
        }
        self
    }

    fn read<T>(&self, null: T, get: impl FnOnce(&LoggerConfig) -> T) -> T {
        match &self.inner {
            Some(inner) => get(&inner.read()),
            None => null,
        }
    }

    /// Builds and emits a log. `severity == None` selects the print severity.
    fn out(
        &self,
        severity: Option<Severity>,
        message: &dyn Display,
        newline: bool,
        error: Option<LogError>,
        location: &'static Location<'static>,
    ) {
        let Some(inner) = &self.inner else {
            return;
        };
        let config = inner.read();

        let Some(output) = &config.output else {
            return;
        };
        let severity = severity.unwrap_or(config.print_severity);
        if config.severity < severity {
            return;
        }
        if config.verbose < config.verbosity {
            return;
        }
        if let Some(err) = &error {
            let err: &(dyn Error + 'static) = &**err;
            if is_context_error(err) && config.verbose < config.ctx_err_verbosity {
                return;
            }
        }

        let mut text = String::with_capacity(config.prefix.len() + 64 + config.suffix.len());
        text.push_str(&config.prefix);
        let _ = write!(text, "{}", message);
        if newline {
            text.push('\n');
        }
        text.push_str(&config.suffix);
        if text.ends_with('\n') {
            text.pop();
        }

        let time = config.time.unwrap_or_else(Utc::now);
        let verbosity = config.verbosity;
        let fields = config.fields.clone();
        let include_stack_trace = config.stack_trace_severity >= severity;
        let depth = if include_stack_trace {
            config.max_stack_frames.max(1)
        } else {
            1
        };
        let output = Arc::clone(output);
        drop(config);

        let trace = StackTrace::capture_at(location, depth);
        let caller = trace
            .callers()
            .next()
            .cloned()
            .unwrap_or_else(|| StackCaller::from_location(location));

        output.log(Log {
            message: text,
            error,
            severity,
            verbosity,
            time,
            fields,
            caller,
            stack_trace: include_stack_trace.then_some(trace),
        });
    }

    /// Emits `message` at `severity`.
    #[track_caller]
    pub fn log(&self, severity: Severity, message: impl Display) {
        self.out(Some(severity), &message, false, None, Location::caller());
    }

    /// Emits formatted arguments at `severity`.
    #[track_caller]
    pub fn logf(&self, severity: Severity, args: fmt::Arguments<'_>) {
        self.out(Some(severity), &args, false, None, Location::caller());
    }

    /// Emits the text of `err` at `severity`, attaching the error to the log.
    #[track_caller]
    pub fn log_error<E>(&self, severity: Severity, err: E)
    where
        E: Error + Send + Sync + 'static,
    {
        let err: LogError = Arc::new(err);
        self.out(Some(severity), &err, false, Some(Arc::clone(&err)), Location::caller());
    }

    /// Emits formatted arguments at `severity`, attaching `err` to the log.
    #[track_caller]
    pub fn log_errorf<E>(&self, severity: Severity, err: E, args: fmt::Arguments<'_>)
    where
        E: Error + Send + Sync + 'static,
    {
        self.out(Some(severity), &args, false, Some(Arc::new(err)), Location::caller());
    }

    /// Logs at FATAL severity, then exits the process with status 1.
    ///
    /// The log is handed to the output before exiting; an output that defers writing
    /// (a [`QueuedOutput`](crate::outputs::QueuedOutput)) may not get to write it.
    #[track_caller]
    pub fn fatal(&self, message: impl Display) -> ! {
        self.out(Some(Severity::Fatal), &message, false, None, Location::caller());
        std::process::exit(1)
    }

    /// Logs at FATAL severity, then exits the process with status 1.
    #[track_caller]
    pub fn fatalf(&self, args: fmt::Arguments<'_>) -> ! {
        self.out(Some(Severity::Fatal), &args, false, None, Location::caller());
        std::process::exit(1)
    }

    /// Logs at FATAL severity, then exits the process with status 1.
    #[track_caller]
    pub fn fatalln(&self, message: impl Display) -> ! {
        self.out(Some(Severity::Fatal), &message, true, None, Location::caller());
        std::process::exit(1)
    }

    #[inline]
    #[track_caller]
    pub fn error(&self, message: impl Display) {
        self.out(Some(Severity::Error), &message, false, None, Location::caller());
    }

    #[inline]
    #[track_caller]
    pub fn errorf(&self, args: fmt::Arguments<'_>) {
        self.out(Some(Severity::Error), &args, false, None, Location::caller());
    }

    #[inline]
    #[track_caller]
    pub fn errorln(&self, message: impl Display) {
        self.out(Some(Severity::Error), &message, true, None, Location::caller());
    }

    #[inline]
    #[track_caller]
    pub fn warning(&self, message: impl Display) {
        self.out(Some(Severity::Warning), &message, false, None, Location::caller());
    }

    #[inline]
    #[track_caller]
    pub fn warningf(&self, args: fmt::Arguments<'_>) {
        self.out(Some(Severity::Warning), &args, false, None, Location::caller());
    }

    #[inline]
    #[track_caller]
    pub fn warningln(&self, message: impl Display) {
        self.out(Some(Severity::Warning), &message, true, None, Location::caller());
    }

    #[inline]
    #[track_caller]
    pub fn info(&self, message: impl Display) {
        self.out(Some(Severity::Info), &message, false, None, Location::caller());
    }

    #[inline]
    #[track_caller]
    pub fn infof(&self, args: fmt::Arguments<'_>) {
        self.out(Some(Severity::Info), &args, false, None, Location::caller());
    }

    #[inline]
    #[track_caller]
    pub fn infoln(&self, message: impl Display) {
        self.out(Some(Severity::Info), &message, true, None, Location::caller());
    }

    #[inline]
    #[track_caller]
    pub fn debug(&self, message: impl Display) {
        self.out(Some(Severity::Debug), &message, false, None, Location::caller());
    }

    #[inline]
    #[track_caller]
    pub fn debugf(&self, args: fmt::Arguments<'_>) {
        self.out(Some(Severity::Debug), &args, false, None, Location::caller());
    }

    #[inline]
    #[track_caller]
    pub fn debugln(&self, message: impl Display) {
        self.out(Some(Severity::Debug), &message, true, None, Location::caller());
    }

    /// Logs at the logger's print severity.
    #[inline]
    #[track_caller]
    pub fn print(&self, message: impl Display) {
        self.out(None, &message, false, None, Location::caller());
    }

    /// Logs at the logger's print severity.
    #[inline]
    #[track_caller]
    pub fn printf(&self, args: fmt::Arguments<'_>) {
        self.out(None, &args, false, None, Location::caller());
    }

    /// Logs at the logger's print severity.
    #[inline]
    #[track_caller]
    pub fn println(&self, message: impl Display) {
        self.out(None, &message, true, None, Location::caller());
    }

    pub fn set_output(&self, output: Arc<dyn Output>) -> &Self {
        self.update(|c| c.output = Some(output))
    }

    /// Detaches the output; the logger emits nothing until a new one is set.
    pub fn clear_output(&self) -> &Self {
        self.update(|c| c.output = None)
    }

    pub fn set_severity(&self, severity: Severity) -> &Self {
        self.update(|c| c.severity = severity)
    }

    /// Sets the severity from a raw value; out-of-range values become INFO.
    pub fn set_severity_raw(&self, raw: i32) -> &Self {
        self.set_severity(Severity::from_raw_or(raw, Severity::Info))
    }

    pub fn set_verbose(&self, verbose: Verbose) -> &Self {
        self.update(|c| c.verbose = verbose)
    }

    /// Sets the severity used by the `print*` methods. Defaults to INFO.
    pub fn set_print_severity(&self, severity: Severity) -> &Self {
        self.update(|c| c.print_severity = severity)
    }

    /// Sets the print severity from a raw value; out-of-range values become INFO.
    pub fn set_print_severity_raw(&self, raw: i32) -> &Self {
        self.set_print_severity(Severity::from_raw_or(raw, Severity::Info))
    }

    /// Sets the severity up to which logs carry a full stack trace. Defaults to NONE.
    pub fn set_stack_trace_severity(&self, severity: Severity) -> &Self {
        self.update(|c| c.stack_trace_severity = severity)
    }

    /// Sets the stack trace severity from a raw value; out-of-range values become NONE.
    pub fn set_stack_trace_severity_raw(&self, raw: i32) -> &Self {
        self.set_stack_trace_severity(Severity::from_raw_or(raw, Severity::None))
    }

    /// Sets how many frames a full stack trace keeps. Defaults to 64.
    pub fn set_max_stack_frames(&self, max_frames: usize) -> &Self {
        self.update(|c| c.max_stack_frames = max_frames)
    }

    pub fn output(&self) -> Option<Arc<dyn Output>> {
        self.read(None, |c| c.output.clone())
    }

    /// Severity threshold; NONE for the null logger
    pub fn severity(&self) -> Severity {
        self.read(Severity::None, |c| c.severity)
    }

    pub fn verbose(&self) -> Verbose {
        self.read(0, |c| c.verbose)
    }

    pub fn print_severity(&self) -> Severity {
        self.read(Severity::None, |c| c.print_severity)
    }

    pub fn stack_trace_severity(&self) -> Severity {
        self.read(Severity::None, |c| c.stack_trace_severity)
    }

    /// Verbosity this logger's logs are emitted with
    pub fn verbosity(&self) -> Verbose {
        self.read(0, |c| c.verbosity)
    }

    /// Derives a logger with `verbosity` if the verbose threshold allows it, else the null logger.
    #[must_use]
    pub fn v(&self, verbosity: Verbose) -> Logger {
        let Some(inner) = &self.inner else {
            return Self::null();
        };
        if inner.read().verbose < verbosity {
            return Self::null();
        }
        self.with_verbosity(verbosity)
    }

    #[must_use]
    pub fn with_verbosity(&self, verbosity: Verbose) -> Logger {
        self.derive(|c| c.verbosity = verbosity)
    }

    /// Derives a logger whose logs are stamped with `time` instead of the current time.
    #[must_use]
    pub fn with_time(&self, time: DateTime<Utc>) -> Logger {
        self.derive(|c| c.time = Some(time))
    }

    #[must_use]
    pub fn without_time(&self) -> Logger {
        self.derive(|c| c.time = None)
    }

    /// Derives a logger with `prefix` appended to the end of the current prefix.
    #[must_use]
    pub fn with_prefix(&self, prefix: impl Display) -> Logger {
        self.derive(|c| {
            let _ = write!(c.prefix, "{}", prefix);
        })
    }

    #[must_use]
    pub fn with_prefixf(&self, args: fmt::Arguments<'_>) -> Logger {
        self.with_prefix(args)
    }

    /// Derives a logger with `suffix` inserted at the start of the current suffix.
    ///
    /// The most recently added suffix ends up closest to the message.
    #[must_use]
    pub fn with_suffix(&self, suffix: impl Display) -> Logger {
        self.derive(|c| c.suffix.insert_str(0, &suffix.to_string()))
    }

    #[must_use]
    pub fn with_suffixf(&self, args: fmt::Arguments<'_>) -> Logger {
        self.with_suffix(args)
    }

    /// Derives a logger with `fields` appended to the current fields.
    #[must_use]
    pub fn with_fields(&self, fields: impl IntoIterator<Item = Field>) -> Logger {
        self.derive(|c| c.fields.extend(fields))
    }

    /// Derives a logger with fields taken from alternating keys and values.
    ///
    /// Keys are rendered with their `Display` form. A trailing key without a value is dropped.
    #[must_use]
    pub fn with_field_key_vals<I, T>(&self, kvs: I) -> Logger
    where
        I: IntoIterator<Item = T>,
        T: Into<FieldValue>,
    {
        let values: Vec<FieldValue> = kvs.into_iter().map(Into::into).collect();
        let fields = values
            .chunks_exact(2)
            .map(|pair| Field::new(pair[0].to_string(), pair[1].clone()))
            .collect::<Vec<_>>();
        self.with_fields(fields)
    }

    /// Derives a logger with one field per map entry, in the map's iteration order.
    #[must_use]
    pub fn with_field_map<K, V>(&self, map: impl IntoIterator<Item = (K, V)>) -> Logger
    where
        K: Into<String>,
        V: Into<FieldValue>,
    {
        self.with_fields(map.into_iter().map(Field::from))
    }

    /// Derives a logger that treats cancellation and deadline errors as logs of `verbosity`.
    ///
    /// Such logs are dropped while the verbose threshold is below `verbosity`.
    #[must_use]
    pub fn with_ctx_err_verbosity(&self, verbosity: Verbose) -> Logger {
        self.derive(|c| c.ctx_err_verbosity = verbosity)
    }
}

impl Clone for Logger {
    fn clone(&self) -> Self {
        self.derive(|_| {})
    }
}

impl Default for Logger {
    /// A logger with INFO severity, verbose 0 and no output
    fn default() -> Self {
        Self::without_output(Severity::Info, 0)
    }
}

impl fmt::Debug for Logger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Some(inner) = &self.inner else {
            return f.write_str("Logger(null)");
        };
        let c = inner.read();
        f.debug_struct("Logger")
            .field("has_output", &c.output.is_some())
            .field("severity", &c.severity)
            .field("verbose", &c.verbose)
            .field("print_severity", &c.print_severity)
            .field("stack_trace_severity", &c.stack_trace_severity)
            .field("max_stack_frames", &c.max_stack_frames)
            .field("ctx_err_verbosity", &c.ctx_err_verbosity)
            .field("verbosity", &c.verbosity)
            .field("time", &c.time)
            .field("prefix", &c.prefix)
            .field("suffix", &c.suffix)
            .field("fields", &c.fields)
            .finish()
    }
}

/// Builder for constructing Logger with a fluent API
///
/// # Example
/// ```
/// use logng::prelude::*;
/// use std::sync::Arc;
///
/// let logger = Logger::builder()
///     .output(Arc::new(TextOutput::new(std::io::stdout(), TextOutputFlags::SEVERITY)))
///     .severity(Severity::Debug)
///     .verbose(2)
///     .build();
/// logger.v(2).debug("visible");
/// ```
pub struct LoggerBuilder {
    config: LoggerConfig,
}

impl LoggerBuilder {
    pub fn new() -> Self {
        Self {
            config: LoggerConfig::new(None, Severity::Info, 0),
        }
    }

    #[must_use = "builder methods return a new value"]
    pub fn output(mut self, output: Arc<dyn Output>) -> Self {
        self.config.output = Some(output);
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn severity(mut self, severity: Severity) -> Self {
        self.config.severity = severity;
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn verbose(mut self, verbose: Verbose) -> Self {
        self.config.verbose = verbose;
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn print_severity(mut self, severity: Severity) -> Self {
        self.config.print_severity = severity;
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn stack_trace_severity(mut self, severity: Severity) -> Self {
        self.config.stack_trace_severity = severity;
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn max_stack_frames(mut self, max_frames: usize) -> Self {
        self.config.max_stack_frames = max_frames;
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn prefix(mut self, prefix: impl Into<String>) -> Self {
        self.config.prefix = prefix.into();
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn suffix(mut self, suffix: impl Into<String>) -> Self {
        self.config.suffix = suffix.into();
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn field(mut self, key: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.config.fields.push(Field::new(key, value));
        self
    }

    pub fn build(self) -> Logger {
        Logger::from_config(self.config)
    }
}

impl Default for LoggerBuilder {
    fn default() -> Self {
        Self::new()
    }
}
