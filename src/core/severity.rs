//! Severity and verbosity definitions

use super::error::{LoggerError, Result};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Verbosity of a log, orthogonal to its severity.
///
/// A log at verbosity `v` is emitted only when the logger's verbose threshold is `>= v`.
pub type Verbose = u32;

/// Severity level of a log.
///
/// Ordered from most restrictive to most permissive: a logger whose severity is `s`
/// emits every log whose severity is `<= s`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum Severity {
    None = 0,
    Fatal = 1,
    Error = 2,
    Warning = 3,
    #[default]
    Info = 4,
    Debug = 5,
}

impl Severity {
    pub const ALL: [Severity; 6] = [
        Severity::None,
        Severity::Fatal,
        Severity::Error,
        Severity::Warning,
        Severity::Info,
        Severity::Debug,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::None => "NONE",
            Severity::Fatal => "FATAL",
            Severity::Error => "ERROR",
            Severity::Warning => "WARNING",
            Severity::Info => "INFO",
            Severity::Debug => "DEBUG",
        }
    }

    /// Returns whether the raw value names one of the six severities.
    pub fn is_valid(raw: i32) -> bool {
        Self::check_valid(raw).is_ok()
    }

    /// Converts a raw value, failing with [`LoggerError::InvalidSeverity`] outside `[None, Debug]`.
    pub fn check_valid(raw: i32) -> Result<Severity> {
        match raw {
            0 => Ok(Severity::None),
            1 => Ok(Severity::Fatal),
            2 => Ok(Severity::Error),
            3 => Ok(Severity::Warning),
            4 => Ok(Severity::Info),
            5 => Ok(Severity::Debug),
            _ => Err(LoggerError::InvalidSeverity),
        }
    }

    /// Converts a raw value, substituting `fallback` when it is out of range.
    pub fn from_raw_or(raw: i32, fallback: Severity) -> Severity {
        Self::check_valid(raw).unwrap_or(fallback)
    }

    #[cfg(feature = "console")]
    pub fn color_code(&self) -> colored::Color {
        use colored::Color::*;
        match self {
            Severity::None => White,
            Severity::Fatal => BrightRed,
            Severity::Error => Red,
            Severity::Warning => Yellow,
            Severity::Info => Green,
            Severity::Debug => Blue,
        }
    }
}

impl TryFrom<i32> for Severity {
    type Error = LoggerError;

    fn try_from(raw: i32) -> Result<Self> {
        Self::check_valid(raw)
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Severity {
    type Err = LoggerError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_uppercase().as_str() {
            "NONE" => Ok(Severity::None),
            "FATAL" => Ok(Severity::Fatal),
            "ERROR" => Ok(Severity::Error),
            "WARNING" => Ok(Severity::Warning),
            "INFO" => Ok(Severity::Info),
            "DEBUG" => Ok(Severity::Debug),
            _ => Err(LoggerError::UnknownSeverity(s.to_string())),
        }
    }
}

impl Serialize for Severity {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Severity {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        text.parse().map_err(serde::de::Error::custom)
    }
}
