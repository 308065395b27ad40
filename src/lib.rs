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

//! This crate offers:
//!
//! *   A transparent interception layer between application code and a
//!     database driver;
//! *   Proxies for connection / statement / result-set objects that log SQL
//!     text, bound parameters, elapsed time and caller location without
//!     changing call semantics.
//!
//! Wrapped objects behave exactly like the unwrapped ones: results are
//! returned unchanged (nested driver objects come back re-wrapped), failures
//! are logged once and rethrown with their original payload, and a separate
//! slow-query channel reports calls that exceed a configurable threshold.
//!
//! ## Example
//!
//! ```rust
//! use dbspy::{DbSpy, LoggingConfig};
//! use std::time::Duration;
//!
//! let config = LoggingConfig::default()
//!     .set_log_before_statement(true)
//!     .set_log_add_batch_detail(true)
//!     .set_slow_query_threshold(Duration::from_millis(200));
//! let spy = DbSpy::new(config);
//! // spy.wrap_connection(meta, connection) yields a proxy that logs every
//! // statement executed through it.
//! ```

pub mod capability;
pub mod config;
pub mod context;
pub mod driver;
pub mod errors;
pub mod handler;
pub mod message;
pub mod proxy;
pub mod sink;
mod spy;

pub use capability::{compatible_capabilities, Capability, TypeDescriptor, TypeLevel};
pub use config::LoggingConfig;
pub use context::LogMetaData;
pub use driver::{CallOutput, DriverObject, MethodId, Value};
pub use errors::{Result, SpyError};
pub use handler::{CallHandler, HandlerPolicy, InterceptedCall, LoggingHandler};
pub use message::LazyMessage;
pub use proxy::SpyProxy;
pub use sink::{Channel, LogLevel, LogSink, Sinks, TracingSink};
pub use spy::{DbSpy, SpyRuntime};
