//! Timestamp formatting for JSON output
//!
//! Provides the layouts the JSON output can render its `time` key with.

use crate::core::error::{LoggerError, Result};
use chrono::{DateTime, SecondsFormat, TimeZone};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Write};

/// Timestamp layout options
///
/// # Examples
///
/// ```
/// use logng::TimestampFormat;
/// use chrono::{TimeZone, Utc};
///
/// let time = Utc.with_ymd_and_hms(2010, 11, 12, 13, 14, 15).unwrap();
/// assert_eq!(TimestampFormat::Rfc3339.format(&time).unwrap(), "2010-11-12T13:14:15Z");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum TimestampFormat {
    /// RFC 3339 with as many sub-second digits as needed: `2010-11-12T13:14:15.123Z`
    ///
    /// UTC times end with `Z`, others with their offset.
    #[default]
    Rfc3339,

    /// RFC 3339 with microseconds: `2010-11-12T13:14:15.123456+02:00`
    Rfc3339Micros,

    /// ISO 8601 with milliseconds, offset without colon: `2010-11-12T13:14:15.123+0200`
    Iso8601,

    /// Custom strftime layout
    ///
    /// ```
    /// use logng::TimestampFormat;
    ///
    /// let format = TimestampFormat::Custom("%Y/%m/%d %H:%M:%S".to_string());
    /// ```
    Custom(String),
}

impl TimestampFormat {
    /// Format a timestamp in its own time zone
    ///
    /// # Errors
    ///
    /// Returns [`LoggerError::InvalidTimeLayout`] when a custom layout holds a
    /// specifier chrono does not know.
    pub fn format<Tz>(&self, datetime: &DateTime<Tz>) -> Result<String>
    where
        Tz: TimeZone,
        Tz::Offset: Display,
    {
        let formatted = match self {
            TimestampFormat::Rfc3339 => datetime.to_rfc3339_opts(SecondsFormat::AutoSi, true),
            TimestampFormat::Rfc3339Micros => {
                datetime.to_rfc3339_opts(SecondsFormat::Micros, true)
            }
            TimestampFormat::Iso8601 => datetime.format("%Y-%m-%dT%H:%M:%S%.3f%z").to_string(),
            TimestampFormat::Custom(layout) => {
                let mut out = String::with_capacity(layout.len() + 16);
                write!(out, "{}", datetime.format(layout))
                    .map_err(|_| LoggerError::InvalidTimeLayout(layout.clone()))?;
                out
            }
        };
        Ok(formatted)
    }
}

impl From<&str> for TimestampFormat {
    fn from(layout: &str) -> Self {
        TimestampFormat::Custom(layout.to_string())
    }
}
