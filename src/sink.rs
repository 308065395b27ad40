/*
 *
 *  *
 *  *      Copyright (c) 2018-2025, SnackCloud All rights reserved.
 *  *
 *  *   Redistribution and use in source and binary forms, with or without
 *  *   modification, are permitted provided that the following conditions are met:
 *  *
 *  *   Redistributions of source code must retain the above copyright notice,
 *  *   this list of conditions and the following disclaimer.
 *  *   Redistributions in binary form must reproduce the above copyright
 *  *   notice, this list of conditions and the following disclaimer in the
 *  *   documentation and/or other materials provided with the distribution.
 *  *   Neither the name of the www.snackcloud.cn developer nor the names of its
 *  *   contributors may be used to endorse or promote products derived from
 *  *   this software without specific prior written permission.
 *  *   Author: SnackCloud
 *  *
 *
 */
use std::sync::Arc;

use tracing::{debug, error, info, trace, warn};

use crate::context;

/// Log level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LogLevel {
    /// Tracking level (lowest priority)
    Trace = 1,
    /// Debug level
    Debug = 2,
    /// Information level
    Info = 3,
    /// Warning level
    Warn = 4,
    /// Error Level (Highest Priority)
    Error = 5,
}

impl LogLevel {
    /// Parsing logs from the string level
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "ERROR" | "ERR" => Some(LogLevel::Error),
            "WARN" | "WARNING" => Some(LogLevel::Warn),
            "INFO" => Some(LogLevel::Info),
            "DEBUG" => Some(LogLevel::Debug),
            "TRACE" => Some(LogLevel::Trace),
            _ => None,
        }
    }

    /// Convert to string
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Error => "ERROR",
            LogLevel::Warn => "WARN",
            LogLevel::Info => "INFO",
            LogLevel::Debug => "DEBUG",
            LogLevel::Trace => "TRACE",
        }
    }

    /// Check if a level is recorded
    pub fn should_log(&self, other: LogLevel) -> bool {
        *self <= other
    }
}

impl PartialOrd for LogLevel {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some((*self as u8).cmp(&(*other as u8)))
    }
}

impl Ord for LogLevel {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        (*self as u8).cmp(&(*other as u8))
    }
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl Default for LogLevel {
    fn default() -> Self {
        Self::Info
    }
}

/// A named log channel: severity gate plus string emission. Sink failures
/// are the sink implementation's problem, not this layer's.
pub trait LogSink: Send + Sync {
    fn enabled(&self, level: LogLevel) -> bool;

    fn log(&self, level: LogLevel, message: &str);
}

/// The two channels the interception layer writes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Channel {
    Statement,
    SlowQuery,
}

/// Default sink emitting through `tracing`, one target per channel, with a
/// local timestamp prefix and the ambient context as a JSON suffix.
pub struct TracingSink {
    channel: Channel,
}

impl TracingSink {
    pub fn new(channel: Channel) -> Self {
        Self { channel }
    }
}

impl LogSink for TracingSink {
    fn enabled(&self, level: LogLevel) -> bool {
        use tracing::Level;
        match (self.channel, level) {
            (Channel::Statement, LogLevel::Trace) => {
                tracing::enabled!(target: "dbspy::statement", Level::TRACE)
            }
            (Channel::Statement, LogLevel::Debug) => {
                tracing::enabled!(target: "dbspy::statement", Level::DEBUG)
            }
            (Channel::Statement, LogLevel::Info) => {
                tracing::enabled!(target: "dbspy::statement", Level::INFO)
            }
            (Channel::Statement, LogLevel::Warn) => {
                tracing::enabled!(target: "dbspy::statement", Level::WARN)
            }
            (Channel::Statement, LogLevel::Error) => {
                tracing::enabled!(target: "dbspy::statement", Level::ERROR)
            }
            (Channel::SlowQuery, LogLevel::Trace) => {
                tracing::enabled!(target: "dbspy::slow_query", Level::TRACE)
            }
            (Channel::SlowQuery, LogLevel::Debug) => {
                tracing::enabled!(target: "dbspy::slow_query", Level::DEBUG)
            }
            (Channel::SlowQuery, LogLevel::Info) => {
                tracing::enabled!(target: "dbspy::slow_query", Level::INFO)
            }
            (Channel::SlowQuery, LogLevel::Warn) => {
                tracing::enabled!(target: "dbspy::slow_query", Level::WARN)
            }
            (Channel::SlowQuery, LogLevel::Error) => {
                tracing::enabled!(target: "dbspy::slow_query", Level::ERROR)
            }
        }
    }

    fn log(&self, level: LogLevel, message: &str) {
        let timestamp = chrono::Local::now().format("%Y-%m-%d %H:%M:%S%.3f");
        let line = match context::current_json() {
            Some(ctx) => format!("{} {} {}", timestamp, message, ctx),
            None => format!("{} {}", timestamp, message),
        };
        match (self.channel, level) {
            (Channel::Statement, LogLevel::Trace) => trace!(target: "dbspy::statement", "{}", line),
            (Channel::Statement, LogLevel::Debug) => debug!(target: "dbspy::statement", "{}", line),
            (Channel::Statement, LogLevel::Info) => info!(target: "dbspy::statement", "{}", line),
            (Channel::Statement, LogLevel::Warn) => warn!(target: "dbspy::statement", "{}", line),
            (Channel::Statement, LogLevel::Error) => error!(target: "dbspy::statement", "{}", line),
            (Channel::SlowQuery, LogLevel::Trace) => {
                trace!(target: "dbspy::slow_query", "{}", line)
            }
            (Channel::SlowQuery, LogLevel::Debug) => {
                debug!(target: "dbspy::slow_query", "{}", line)
            }
            (Channel::SlowQuery, LogLevel::Info) => info!(target: "dbspy::slow_query", "{}", line),
            (Channel::SlowQuery, LogLevel::Warn) => warn!(target: "dbspy::slow_query", "{}", line),
            (Channel::SlowQuery, LogLevel::Error) => {
                error!(target: "dbspy::slow_query", "{}", line)
            }
        }
    }
}

/// The sink pair every handler writes to: the primary statement channel and
/// the separate slow-operation channel.
#[derive(Clone)]
pub struct Sinks {
    pub statement: Arc<dyn LogSink>,
    pub slow_query: Arc<dyn LogSink>,
}

impl Sinks {
    pub fn new(statement: Arc<dyn LogSink>, slow_query: Arc<dyn LogSink>) -> Self {
        Self {
            statement,
            slow_query,
        }
    }
}

impl Default for Sinks {
    fn default() -> Self {
        Self {
            statement: Arc::new(TracingSink::new(Channel::Statement)),
            slow_query: Arc::new(TracingSink::new(Channel::SlowQuery)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_ordering() {
        assert!(LogLevel::Info.should_log(LogLevel::Error));
        assert!(LogLevel::Info.should_log(LogLevel::Info));
        assert!(!LogLevel::Info.should_log(LogLevel::Debug));
    }

    #[test]
    fn test_level_round_trip() {
        for level in [
            LogLevel::Trace,
            LogLevel::Debug,
            LogLevel::Info,
            LogLevel::Warn,
            LogLevel::Error,
        ] {
            assert_eq!(Some(level), LogLevel::from_str(level.as_str()));
        }
        assert_eq!(None, LogLevel::from_str("noisy"));
    }
}
