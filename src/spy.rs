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

use crate::config::LoggingConfig;
use crate::context::LogMetaData;
use crate::driver::DriverObject;
use crate::errors::Result;
use crate::proxy::{
    self, SpyProxy, wrap_by_callable_statement_proxy, wrap_by_connection_proxy,
    wrap_by_connection_source_proxy, wrap_by_prepared_statement_proxy, wrap_by_result_set_proxy,
    wrap_by_statement_proxy,
};
use crate::sink::Sinks;

/// Immutable bundle shared by every handler a wrap produces: the resolved
/// configuration snapshot and the two log channels.
pub struct SpyRuntime {
    config: LoggingConfig,
    sinks: Sinks,
}

impl SpyRuntime {
    pub fn new(config: LoggingConfig, sinks: Sinks) -> Self {
        Self { config, sinks }
    }

    pub fn config(&self) -> &LoggingConfig {
        &self.config
    }

    pub fn sinks(&self) -> &Sinks {
        &self.sinks
    }
}

/// Entry point for wrapping live driver objects.
///
/// ```rust
/// use dbspy::{DbSpy, LoggingConfig};
/// use std::time::Duration;
///
/// let config = LoggingConfig::default()
///     .set_log_before_statement(true)
///     .set_slow_query_threshold(Duration::from_millis(200));
/// let spy = DbSpy::new(config);
/// ```
pub struct DbSpy {
    runtime: Arc<SpyRuntime>,
}

impl DbSpy {
    /// Wrap with the default tracing-backed sinks.
    pub fn new(config: LoggingConfig) -> Self {
        Self::with_sinks(config, Sinks::default())
    }

    pub fn with_sinks(config: LoggingConfig, sinks: Sinks) -> Self {
        Self {
            runtime: Arc::new(SpyRuntime::new(config, sinks)),
        }
    }

    pub fn runtime(&self) -> &Arc<SpyRuntime> {
        &self.runtime
    }

    pub fn wrap_connection(
        &self,
        meta: Option<LogMetaData>,
        target: Box<dyn DriverObject>,
    ) -> Result<SpyProxy> {
        wrap_by_connection_proxy(self.runtime.clone(), meta.map(Arc::new), target)
    }

    pub fn wrap_statement(
        &self,
        meta: Option<LogMetaData>,
        target: Box<dyn DriverObject>,
    ) -> Result<SpyProxy> {
        wrap_by_statement_proxy(self.runtime.clone(), meta.map(Arc::new), target)
    }

    pub fn wrap_prepared_statement(
        &self,
        meta: Option<LogMetaData>,
        target: Box<dyn DriverObject>,
        sql: &str,
    ) -> Result<SpyProxy> {
        wrap_by_prepared_statement_proxy(
            self.runtime.clone(),
            meta.map(Arc::new),
            target,
            sql.to_string(),
        )
    }

    pub fn wrap_callable_statement(
        &self,
        meta: Option<LogMetaData>,
        target: Box<dyn DriverObject>,
        sql: &str,
    ) -> Result<SpyProxy> {
        wrap_by_callable_statement_proxy(
            self.runtime.clone(),
            meta.map(Arc::new),
            target,
            sql.to_string(),
        )
    }

    pub fn wrap_result_set(
        &self,
        meta: Option<LogMetaData>,
        target: Box<dyn DriverObject>,
    ) -> Result<SpyProxy> {
        wrap_by_result_set_proxy(self.runtime.clone(), meta.map(Arc::new), target)
    }

    pub fn wrap_connection_source(&self, target: Box<dyn DriverObject>) -> Result<SpyProxy> {
        wrap_by_connection_source_proxy(self.runtime.clone(), target)
    }

    /// Wrap an arbitrary object by its runtime capability, the same routing
    /// nested call results go through.
    pub fn wrap(
        &self,
        meta: Option<LogMetaData>,
        target: Box<dyn DriverObject>,
    ) -> Result<crate::driver::CallOutput> {
        proxy::wrap(
            &self.runtime,
            &meta.map(Arc::new),
            crate::driver::CallOutput::Object(target),
            None,
        )
    }
}
