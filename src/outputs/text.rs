//! Human-readable text output

use crate::core::{
    error::LoggerError,
    log::Log,
    output::{ErrorCallback, Output},
    stack::StackFormat,
};
use chrono::{DateTime, Local, TimeZone};
use parking_lot::{Mutex, RwLock};
use std::fmt::{Display, Write as _};
use std::io::Write;

bitflags::bitflags! {
    /// Parts of a log rendered by [`TextOutput`]
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct TextOutputFlags: u32 {
        /// `2009/01/23 `
        const DATE = 1 << 0;
        /// `01:23:23 `
        const TIME = 1 << 1;
        /// `01:23:23.123123 `, implies TIME
        const MICROSECONDS = 1 << 2;
        /// Date and time in UTC instead of the local time zone
        const UTC = 1 << 3;
        const SEVERITY = 1 << 4;
        /// Indents continuation lines of multi-line messages under the first line
        const PADDING = 1 << 5;
        const LONG_FUNC = 1 << 6;
        const SHORT_FUNC = 1 << 7;
        const LONG_FILE = 1 << 8;
        const SHORT_FILE = 1 << 9;
        const FIELDS = 1 << 10;
        const STACK_TRACE = 1 << 11;
        /// File names without directories in the stack trace block
        const SHORT_STACK_FILE = 1 << 12;
        /// Colored severity (with the `console` feature)
        const COLOR = 1 << 13;

        const DEFAULT = Self::DATE.bits()
            | Self::TIME.bits()
            | Self::SEVERITY.bits()
            | Self::PADDING.bits()
            | Self::FIELDS.bits()
            | Self::STACK_TRACE.bits();
    }
}

impl Default for TextOutputFlags {
    fn default() -> Self {
        Self::DEFAULT
    }
}

struct TextState {
    writer: Box<dyn Write + Send>,
    flags: TextOutputFlags,
}

/// Output writing one text block per log.
///
/// ```text
/// 2010/11/12 13:14:15 INFO - first line
///                            second line
///
/// 	+ "user"="alice" "attempt"="3"
///
/// ```
///
/// Formatting and writing happen under one lock, so blocks from concurrent callers
/// never interleave. Write failures go to the error hook.
pub struct TextOutput {
    state: Mutex<TextState>,
    on_error: RwLock<Option<ErrorCallback>>,
}

impl TextOutput {
    pub fn new(writer: impl Write + Send + 'static, flags: TextOutputFlags) -> Self {
        Self {
            state: Mutex::new(TextState {
                writer: Box::new(writer),
                flags,
            }),
            on_error: RwLock::new(None),
        }
    }

    pub fn set_writer(&self, writer: impl Write + Send + 'static) -> &Self {
        self.state.lock().writer = Box::new(writer);
        self
    }

    pub fn flags(&self) -> TextOutputFlags {
        self.state.lock().flags
    }

    pub fn set_flags(&self, flags: TextOutputFlags) -> &Self {
        self.state.lock().flags = flags;
        self
    }

    /// Sets the hook receiving write errors.
    pub fn set_on_error(&self, on_error: Option<ErrorCallback>) -> &Self {
        *self.on_error.write() = on_error;
        self
    }

    fn report(&self, err: LoggerError) {
        let on_error = self.on_error.read().clone();
        if let Some(on_error) = on_error {
            on_error(&err);
        }
    }
}

impl Output for TextOutput {
    fn log(&self, log: Log) {
        let result = {
            let mut state = self.state.lock();
            let block = format_log(&log, state.flags);
            state
                .writer
                .write_all(block.as_bytes())
                .and_then(|()| state.writer.flush())
        };
        if let Err(e) = result {
            self.report(LoggerError::write_failed("text", e));
        }
    }
}

fn format_log(log: &Log, flags: TextOutputFlags) -> String {
    let mut buf = String::with_capacity(256 + log.message.len());
    // Terminal color codes take bytes but no columns.
    let mut invisible = 0;

    let clock = TextOutputFlags::DATE | TextOutputFlags::TIME | TextOutputFlags::MICROSECONDS;
    if flags.intersects(clock) {
        if flags.contains(TextOutputFlags::UTC) {
            write_time(&mut buf, &log.time, flags);
        } else {
            write_time(&mut buf, &log.time.with_timezone(&Local), flags);
        }
    }

    if flags.contains(TextOutputFlags::SEVERITY) {
        let name = log.severity.as_str();
        if flags.contains(TextOutputFlags::COLOR) {
            let painted = paint_severity(log);
            invisible += painted.len() - name.len();
            buf.push_str(&painted);
        } else {
            buf.push_str(name);
        }
        buf.push_str(" - ");
    }

    let padding = if flags.contains(TextOutputFlags::PADDING) {
        " ".repeat(buf.len() - invisible)
    } else {
        String::new()
    };

    if flags.intersects(TextOutputFlags::LONG_FUNC | TextOutputFlags::SHORT_FUNC) {
        let function = if flags.contains(TextOutputFlags::SHORT_FUNC) {
            log.caller.short_function()
        } else {
            log.caller.function_or_unknown()
        };
        let _ = write!(buf, "{}() - ", function);
    }

    if flags.intersects(TextOutputFlags::LONG_FILE | TextOutputFlags::SHORT_FILE) {
        let file = if flags.contains(TextOutputFlags::SHORT_FILE) {
            log.caller.short_file()
        } else {
            log.caller.file_or_unknown()
        };
        let _ = write!(buf, "{}:{} - ", file, log.caller.line);
    }

    for (i, line) in log.message.split('\n').enumerate() {
        if i > 0 {
            buf.push_str(&padding);
        }
        buf.push_str(line);
        buf.push('\n');
    }

    let mut extended = false;

    if flags.contains(TextOutputFlags::FIELDS) && !log.fields.is_empty() {
        extended = true;
        buf.push_str("\t\n\t+ ");
        for (i, field) in log.fields.iter().enumerate() {
            if i > 0 {
                buf.push(' ');
            }
            let _ = write!(buf, "{:?}={:?}", field.key, field.value.to_string());
        }
        buf.push_str("\n\t\n");
    }

    let trace = log
        .stack_trace
        .as_ref()
        .filter(|_| flags.contains(TextOutputFlags::STACK_TRACE));
    if let Some(trace) = trace {
        if !extended {
            buf.push_str("\t\n");
        }
        let format = StackFormat::tabbed(1, 1)
            .with_short_file(flags.contains(TextOutputFlags::SHORT_STACK_FILE));
        buf.push_str(&trace.format_with(&format));
        buf.push_str("\n\t\n");
    }

    buf
}

fn write_time<Tz>(buf: &mut String, time: &DateTime<Tz>, flags: TextOutputFlags)
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    if flags.contains(TextOutputFlags::DATE) {
        let _ = write!(buf, "{} ", time.format("%Y/%m/%d"));
    }
    if flags.contains(TextOutputFlags::MICROSECONDS) {
        let _ = write!(buf, "{} ", time.format("%H:%M:%S%.6f"));
    } else if flags.contains(TextOutputFlags::TIME) {
        let _ = write!(buf, "{} ", time.format("%H:%M:%S"));
    }
}

#[cfg(feature = "console")]
fn paint_severity(log: &Log) -> String {
    use colored::Colorize;
    log.severity
        .as_str()
        .color(log.severity.color_code())
        .to_string()
}

#[cfg(not(feature = "console"))]
fn paint_severity(log: &Log) -> String {
    log.severity.as_str().to_string()
}
