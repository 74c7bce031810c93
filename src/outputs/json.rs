//! JSON lines output

use crate::core::{
    error::{LoggerError, Result},
    log::Log,
    output::{ErrorCallback, Output},
    stack::StackFormat,
    timestamp::TimestampFormat,
};
use chrono::Local;
use parking_lot::{Mutex, RwLock};
use serde_json::{Map, Value};
use std::io::Write;

bitflags::bitflags! {
    /// Keys written by [`JsonOutput`]
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct JsonOutputFlags: u32 {
        /// `"severity": "INFO"`
        const SEVERITY = 1 << 0;
        /// `"time"` rendered with the output's time format
        const TIME = 1 << 1;
        /// `"timestamp"` in Unix seconds
        const TIMESTAMP = 1 << 2;
        /// `"timestamp"` in Unix microseconds, overrides TIMESTAMP
        const TIMESTAMP_MICRO = 1 << 3;
        /// `"time"` in UTC instead of the local time zone
        const UTC = 1 << 4;
        /// `"severity_level": 4`
        const SEVERITY_LEVEL = 1 << 5;
        const VERBOSITY = 1 << 6;
        const LONG_FUNC = 1 << 7;
        const SHORT_FUNC = 1 << 8;
        const LONG_FILE = 1 << 9;
        const SHORT_FILE = 1 << 10;
        const STACK_TRACE = 1 << 11;
        /// One `"_key"` entry per field
        const FIELDS = 1 << 12;

        const DEFAULT = Self::SEVERITY.bits()
            | Self::TIME.bits()
            | Self::LONG_FUNC.bits()
            | Self::SHORT_FILE.bits()
            | Self::STACK_TRACE.bits()
            | Self::FIELDS.bits();
    }
}

impl Default for JsonOutputFlags {
    fn default() -> Self {
        Self::DEFAULT
    }
}

struct JsonState {
    writer: Box<dyn Write + Send>,
    flags: JsonOutputFlags,
    time_format: TimestampFormat,
}

/// Output writing one JSON object per line.
///
/// `message` is always present; every other key is written only when its flag is set.
/// Field keys get a leading underscore, and a key seen before in the same log is
/// prefixed with the field's index instead, so no field is lost.
///
/// # Example
///
/// ```
/// use logng::prelude::*;
/// use std::sync::Arc;
///
/// let output = JsonOutput::new(std::io::stdout(), JsonOutputFlags::SEVERITY);
/// output.set_time_layout("%Y-%m-%d %H:%M:%S");
/// let logger = Logger::new(Arc::new(output), Severity::Info, 0);
/// logger.with_field_key_vals(["user", "alice"]).info("signed in");
/// ```
pub struct JsonOutput {
    state: Mutex<JsonState>,
    on_error: RwLock<Option<ErrorCallback>>,
}

impl JsonOutput {
    pub fn new(writer: impl Write + Send + 'static, flags: JsonOutputFlags) -> Self {
        Self {
            state: Mutex::new(JsonState {
                writer: Box::new(writer),
                flags,
                time_format: TimestampFormat::default(),
            }),
            on_error: RwLock::new(None),
        }
    }

    pub fn set_writer(&self, writer: impl Write + Send + 'static) -> &Self {
        self.state.lock().writer = Box::new(writer);
        self
    }

    pub fn flags(&self) -> JsonOutputFlags {
        self.state.lock().flags
    }

    pub fn set_flags(&self, flags: JsonOutputFlags) -> &Self {
        self.state.lock().flags = flags;
        self
    }

    /// Sets how the `time` key is rendered. Defaults to RFC 3339 with sub-seconds.
    pub fn set_time_format(&self, time_format: TimestampFormat) -> &Self {
        self.state.lock().time_format = time_format;
        self
    }

    /// Sets a strftime layout for the `time` key.
    pub fn set_time_layout(&self, layout: &str) -> &Self {
        self.set_time_format(TimestampFormat::from(layout))
    }

    /// Sets the hook receiving serialization and write errors.
    pub fn set_on_error(&self, on_error: Option<ErrorCallback>) -> &Self {
        *self.on_error.write() = on_error;
        self
    }

    fn write(&self, log: &Log) -> Result<()> {
        let mut state = self.state.lock();
        let object = to_object(log, state.flags, &state.time_format)?;
        let mut line = serde_json::to_vec(&object)?;
        line.push(b'\n');
        state
            .writer
            .write_all(&line)
            .and_then(|()| state.writer.flush())
            .map_err(|e| LoggerError::write_failed("json", e))
    }
}

impl Output for JsonOutput {
    fn log(&self, log: Log) {
        if let Err(err) = self.write(&log) {
            let on_error = self.on_error.read().clone();
            if let Some(on_error) = on_error {
                on_error(&err);
            }
        }
    }
}

fn to_object(
    log: &Log,
    flags: JsonOutputFlags,
    time_format: &TimestampFormat,
) -> Result<Map<String, Value>> {
    let mut object = Map::new();

    if flags.contains(JsonOutputFlags::SEVERITY) {
        object.insert("severity".into(), log.severity.as_str().into());
    }

    object.insert("message".into(), log.message.as_str().into());

    if flags.contains(JsonOutputFlags::TIME) {
        let time = if flags.contains(JsonOutputFlags::UTC) {
            time_format.format(&log.time)?
        } else {
            time_format.format(&log.time.with_timezone(&Local))?
        };
        object.insert("time".into(), time.into());
    }

    if flags.contains(JsonOutputFlags::TIMESTAMP_MICRO) {
        object.insert("timestamp".into(), log.time.timestamp_micros().into());
    } else if flags.contains(JsonOutputFlags::TIMESTAMP) {
        object.insert("timestamp".into(), log.time.timestamp().into());
    }

    if flags.contains(JsonOutputFlags::SEVERITY_LEVEL) {
        object.insert("severity_level".into(), (log.severity as i32).into());
    }

    if flags.contains(JsonOutputFlags::VERBOSITY) {
        object.insert("verbosity".into(), log.verbosity.into());
    }

    if flags.intersects(JsonOutputFlags::LONG_FUNC | JsonOutputFlags::SHORT_FUNC) {
        let function = if flags.contains(JsonOutputFlags::SHORT_FUNC) {
            log.caller.short_function()
        } else {
            log.caller.function_or_unknown()
        };
        object.insert("func".into(), function.into());
    }

    if flags.intersects(JsonOutputFlags::LONG_FILE | JsonOutputFlags::SHORT_FILE) {
        let file = if flags.contains(JsonOutputFlags::SHORT_FILE) {
            log.caller.short_file()
        } else {
            log.caller.file_or_unknown()
        };
        object.insert("file".into(), format!("{}:{}", file, log.caller.line).into());
    }

    if let Some(trace) = log.stack_trace.as_ref() {
        if flags.contains(JsonOutputFlags::STACK_TRACE) {
            let rendered = trace.format_with(&StackFormat::tabbed(0, 1));
            object.insert("stack_trace".into(), rendered.into());
        }
    }

    if flags.contains(JsonOutputFlags::FIELDS) {
        for (index, field) in log.fields.iter().enumerate() {
            let mut key = format!("_{}", field.key);
            if object.contains_key(&key) {
                key = format!("{}_{}", index, field.key);
            }
            object.insert(key, field.value.to_json_value());
        }
    }

    Ok(object)
}
