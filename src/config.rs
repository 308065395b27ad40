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
use std::time::Duration;

/// Already-resolved logging switches, read-only to the interception core.
/// No parsing or loading happens here.
#[derive(Clone, Debug)]
pub struct LoggingConfig {
    log_before_statement: bool,
    log_detail_after_statement: bool,
    log_add_batch: bool,
    log_add_batch_detail: bool,
    log_execute_batch_detail: bool,
    slow_query_threshold: Duration,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        LoggingConfig {
            log_before_statement: false,
            log_detail_after_statement: true,
            log_add_batch: true,
            log_add_batch_detail: false,
            log_execute_batch_detail: false,
            slow_query_threshold: Duration::from_secs(1),
        }
    }
}

impl LoggingConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Emit the message before the underlying call as well, paired with the
    /// END rewrite afterwards.
    pub fn set_log_before_statement(mut self, enabled: bool) -> Self {
        self.log_before_statement = enabled;
        self
    }

    pub fn log_before_statement(&self) -> bool {
        self.log_before_statement
    }

    /// Emit the full detailed message after the call; when disabled a
    /// condensed end message is used instead.
    pub fn set_log_detail_after_statement(mut self, enabled: bool) -> Self {
        self.log_detail_after_statement = enabled;
        self
    }

    pub fn log_detail_after_statement(&self) -> bool {
        self.log_detail_after_statement
    }

    pub fn set_log_add_batch(mut self, enabled: bool) -> Self {
        self.log_add_batch = enabled;
        self
    }

    pub fn log_add_batch(&self) -> bool {
        self.log_add_batch
    }

    pub fn set_log_add_batch_detail(mut self, enabled: bool) -> Self {
        self.log_add_batch_detail = enabled;
        self
    }

    pub fn log_add_batch_detail(&self) -> bool {
        self.log_add_batch_detail
    }

    pub fn set_log_execute_batch_detail(mut self, enabled: bool) -> Self {
        self.log_execute_batch_detail = enabled;
        self
    }

    pub fn log_execute_batch_detail(&self) -> bool {
        self.log_execute_batch_detail
    }

    /// Calls at or above this elapsed time are additionally reported on the
    /// slow-query channel. Observational only, never a cancellation trigger.
    pub fn set_slow_query_threshold(mut self, threshold: Duration) -> Self {
        self.slow_query_threshold = threshold;
        self
    }

    pub fn slow_query_threshold(&self) -> Duration {
        self.slow_query_threshold
    }
}
