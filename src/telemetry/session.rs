//! Session identifiers

use chrono::{DateTime, Local, TimeZone};
use serde::Serialize;
use std::fmt;

/// Identifies one process run; local start time as `YYYYMMDD_HHMMSS`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct SessionId(String);

impl SessionId {
    const FORMAT: &'static str = "%Y%m%d_%H%M%S";

    /// Session starting now
    pub fn now() -> Self {
        Self::at(&Local::now())
    }

    /// Session starting at the given time
    pub fn at<Tz: TimeZone>(time: &DateTime<Tz>) -> Self
    where
        Tz::Offset: fmt::Display,
    {
        Self(time.format(Self::FORMAT).to_string())
    }

    /// Use an existing label verbatim
    pub fn from_label(label: impl Into<String>) -> Self {
        Self(label.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// File name of the session's error log
    pub fn log_file_name(&self) -> String {
        format!("trading_{}.log", self.0)
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
