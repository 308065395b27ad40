//!
//! Common Errors.
//!
use std::fmt;

#[derive(Debug)]
pub enum SpyError {
    /// Failure raised by the wrapped driver object. The original payload is
    /// carried unmodified and returned as-is after being logged.
    Driver(anyhow::Error),
    /// The resolved capability set for a proxy came back empty.
    IncompatibleProxy(String),
    /// A proxy was invoked with a method outside its exposed capability set.
    UnsupportedMethod(String),
}

pub type Result<T> = std::result::Result<T, SpyError>;

impl fmt::Display for SpyError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            SpyError::Driver(ref err) => err.fmt(f),
            SpyError::IncompatibleProxy(ref err) => err.fmt(f),
            SpyError::UnsupportedMethod(ref err) => err.fmt(f),
        }
    }
}

impl std::error::Error for SpyError {}

impl From<anyhow::Error> for SpyError {
    fn from(err: anyhow::Error) -> Self {
        SpyError::Driver(err)
    }
}
