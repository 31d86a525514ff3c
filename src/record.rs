//! Log records as handed to the sink by a logging front end.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use time::OffsetDateTime;

/// Named integer severities. Records carry the raw integer so that
/// front ends with their own scales can still be stored.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Debug,
    Info,
    Notice,
    Warning,
    Error,
    Critical,
    Alert,
    Emergency,
}

impl Level {
    pub fn value(self) -> i64 {
        match self {
            Self::Debug => 100,
            Self::Info => 200,
            Self::Notice => 250,
            Self::Warning => 300,
            Self::Error => 400,
            Self::Critical => 500,
            Self::Alert => 550,
            Self::Emergency => 600,
        }
    }
}

impl From<log::Level> for Level {
    fn from(level: log::Level) -> Self {
        match level {
            log::Level::Error => Self::Error,
            log::Level::Warn => Self::Warning,
            log::Level::Info => Self::Info,
            log::Level::Debug | log::Level::Trace => Self::Debug,
        }
    }
}

/// One emitted log entry.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LogRecord {
    pub channel: String,
    pub level: i64,
    pub message: String,
    #[serde(with = "time::serde::rfc3339")]
    pub datetime: OffsetDateTime,
    #[serde(default)]
    pub context: Map<String, Value>,
    #[serde(default)]
    pub extra: Map<String, Value>,
}

impl LogRecord {
    pub fn new(channel: impl Into<String>, level: Level, message: impl Into<String>) -> Self {
        Self {
            channel: channel.into(),
            level: level.value(),
            message: message.into(),
            datetime: OffsetDateTime::now_utc(),
            context: Map::new(),
            extra: Map::new(),
        }
    }

    pub fn at(mut self, datetime: OffsetDateTime) -> Self {
        self.datetime = datetime;
        self
    }

    pub fn with_context(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.context.insert(key.into(), value.into());
        self
    }

    pub fn with_extra(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.extra.insert(key.into(), value.into());
        self
    }

    /// Context with `extra` folded in; `extra` wins on key collisions.
    pub fn merged_context(&self) -> Map<String, Value> {
        let mut merged = self.context.clone();
        for (key, value) in &self.extra {
            merged.insert(key.clone(), value.clone());
        }
        merged
    }
}
