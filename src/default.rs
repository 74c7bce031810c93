//! Process-wide default logger
//!
//! The default logger writes through the default [`TextOutput`] to stderr at INFO
//! severity. The free functions in this module delegate to it.

use crate::core::{
    field::{Field, FieldValue},
    logger::Logger,
    output::Output,
    severity::{Severity, Verbose},
    stack::DEFAULT_MAX_STACK_FRAMES,
};
use crate::outputs::text::{TextOutput, TextOutputFlags};
use chrono::{DateTime, Utc};
use std::fmt::{self, Display};
use std::io::{self, Write};
use std::sync::{Arc, OnceLock};

static DEFAULT_TEXT_OUTPUT: OnceLock<Arc<TextOutput>> = OnceLock::new();
static DEFAULT_LOGGER: OnceLock<Logger> = OnceLock::new();

/// The text output the default logger starts with: stderr, [`TextOutputFlags::DEFAULT`]
pub fn default_text_output() -> &'static Arc<TextOutput> {
    DEFAULT_TEXT_OUTPUT
        .get_or_init(|| Arc::new(TextOutput::new(io::stderr(), TextOutputFlags::DEFAULT)))
}

pub fn default_logger() -> &'static Logger {
    DEFAULT_LOGGER.get_or_init(|| {
        let output: Arc<dyn Output> = default_text_output().clone();
        Logger::new(output, Severity::Info, 0)
    })
}

/// Restores the default logger and the default text output to their initial settings.
pub fn reset() {
    default_text_output()
        .set_writer(io::stderr())
        .set_flags(TextOutputFlags::DEFAULT)
        .set_on_error(None);
    let output: Arc<dyn Output> = default_text_output().clone();
    default_logger()
        .set_output(output)
        .set_severity(Severity::Info)
        .set_verbose(0)
        .set_print_severity(Severity::Info)
        .set_stack_trace_severity(Severity::None)
        .set_max_stack_frames(DEFAULT_MAX_STACK_FRAMES);
}

/// Sets the writer of the default text output.
pub fn set_text_output_writer(writer: impl Write + Send + 'static) -> &'static TextOutput {
    default_text_output().set_writer(writer)
}

pub fn set_text_output_flags(flags: TextOutputFlags) -> &'static TextOutput {
    default_text_output().set_flags(flags)
}

#[track_caller]
pub fn log(severity: Severity, message: impl Display) {
    default_logger().log(severity, message);
}

#[track_caller]
pub fn fatal(message: impl Display) -> ! {
    default_logger().fatal(message)
}

#[track_caller]
pub fn fatalf(args: fmt::Arguments<'_>) -> ! {
    default_logger().fatalf(args)
}

#[track_caller]
pub fn fatalln(message: impl Display) -> ! {
    default_logger().fatalln(message)
}

#[track_caller]
pub fn error(message: impl Display) {
    default_logger().error(message);
}

#[track_caller]
pub fn errorf(args: fmt::Arguments<'_>) {
    default_logger().errorf(args);
}

#[track_caller]
pub fn errorln(message: impl Display) {
    default_logger().errorln(message);
}

#[track_caller]
pub fn warning(message: impl Display) {
    default_logger().warning(message);
}

#[track_caller]
pub fn warningf(args: fmt::Arguments<'_>) {
    default_logger().warningf(args);
}

#[track_caller]
pub fn warningln(message: impl Display) {
    default_logger().warningln(message);
}

#[track_caller]
pub fn info(message: impl Display) {
    default_logger().info(message);
}

#[track_caller]
pub fn infof(args: fmt::Arguments<'_>) {
    default_logger().infof(args);
}

#[track_caller]
pub fn infoln(message: impl Display) {
    default_logger().infoln(message);
}

#[track_caller]
pub fn debug(message: impl Display) {
    default_logger().debug(message);
}

#[track_caller]
pub fn debugf(args: fmt::Arguments<'_>) {
    default_logger().debugf(args);
}

#[track_caller]
pub fn debugln(message: impl Display) {
    default_logger().debugln(message);
}

#[track_caller]
pub fn print(message: impl Display) {
    default_logger().print(message);
}

#[track_caller]
pub fn printf(args: fmt::Arguments<'_>) {
    default_logger().printf(args);
}

#[track_caller]
pub fn println(message: impl Display) {
    default_logger().println(message);
}

pub fn set_output(output: Arc<dyn Output>) -> &'static Logger {
    default_logger().set_output(output)
}

pub fn set_severity(severity: Severity) -> &'static Logger {
    default_logger().set_severity(severity)
}

pub fn set_verbose(verbose: Verbose) -> &'static Logger {
    default_logger().set_verbose(verbose)
}

pub fn set_print_severity(severity: Severity) -> &'static Logger {
    default_logger().set_print_severity(severity)
}

pub fn set_stack_trace_severity(severity: Severity) -> &'static Logger {
    default_logger().set_stack_trace_severity(severity)
}

pub fn v(verbosity: Verbose) -> Logger {
    default_logger().v(verbosity)
}

pub fn with_time(time: DateTime<Utc>) -> Logger {
    default_logger().with_time(time)
}

pub fn with_prefix(prefix: impl Display) -> Logger {
    default_logger().with_prefix(prefix)
}

pub fn with_prefixf(args: fmt::Arguments<'_>) -> Logger {
    default_logger().with_prefixf(args)
}

pub fn with_suffix(suffix: impl Display) -> Logger {
    default_logger().with_suffix(suffix)
}

pub fn with_suffixf(args: fmt::Arguments<'_>) -> Logger {
    default_logger().with_suffixf(args)
}

pub fn with_fields(fields: impl IntoIterator<Item = Field>) -> Logger {
    default_logger().with_fields(fields)
}

pub fn with_field_key_vals<I, T>(kvs: I) -> Logger
where
    I: IntoIterator<Item = T>,
    T: Into<FieldValue>,
{
    default_logger().with_field_key_vals(kvs)
}

pub fn with_field_map<K, V>(map: impl IntoIterator<Item = (K, V)>) -> Logger
where
    K: Into<String>,
    V: Into<FieldValue>,
{
    default_logger().with_field_map(map)
}

pub fn with_ctx_err_verbosity(verbosity: Verbose) -> Logger {
    default_logger().with_ctx_err_verbosity(verbosity)
}
