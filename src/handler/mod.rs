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
use std::collections::BTreeMap;
use std::panic::Location;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::context::{self, LogMetaData};
use crate::driver::{CallOutput, DriverObject, MethodId, Value};
use crate::errors::{Result, SpyError};
use crate::message::LazyMessage;
use crate::proxy;
use crate::sink::{LogLevel, LogSink};
use crate::spy::SpyRuntime;

mod connection;
mod statement;

pub use connection::{ConnectionPolicy, ConnectionSourcePolicy, ResultSetPolicy};
pub use statement::{CallableStatementPolicy, PreparedStatementPolicy, StatementPolicy};

/// Transient per-invocation record: method identity, argument list, caller
/// location and a monotonic entry timestamp. Created at call entry,
/// discarded at call exit.
pub struct InterceptedCall {
    method: MethodId,
    args: Vec<Value>,
    location: &'static Location<'static>,
    entered: Instant,
}

impl InterceptedCall {
    #[track_caller]
    pub fn new(method: MethodId, args: Vec<Value>) -> Self {
        Self {
            method,
            args,
            location: Location::caller(),
            entered: Instant::now(),
        }
    }

    pub fn method(&self) -> &MethodId {
        &self.method
    }

    pub fn args(&self) -> &[Value] {
        &self.args
    }

    pub fn location(&self) -> &'static Location<'static> {
        self.location
    }

    pub fn entered(&self) -> Instant {
        self.entered
    }
}

/// Owned snapshot of one loggable statement: SQL text plus whatever
/// positional and named parameters were bound when the snapshot was taken.
/// Cloning is cheap; the expensive formatting stays deferred until a log
/// message is materialized.
#[derive(Debug, Clone, Default)]
pub struct StatementSnapshot {
    sql: String,
    positional: BTreeMap<usize, Value>,
    named: Vec<(String, Value)>,
}

impl StatementSnapshot {
    pub fn new(sql: impl Into<String>) -> Self {
        Self {
            sql: sql.into(),
            positional: BTreeMap::new(),
            named: Vec::new(),
        }
    }

    pub fn with_positional(mut self, positional: BTreeMap<usize, Value>) -> Self {
        self.positional = positional;
        self
    }

    pub fn with_named(mut self, named: Vec<(String, Value)>) -> Self {
        self.named = named;
        self
    }

    /// Render the SQL with positional placeholders substituted inline
    /// (1-based, unbound placeholders left as `?`) and named parameters as
    /// a trailing map.
    pub fn render_into(&self, buf: &mut String) {
        let mut index = 0usize;
        for ch in self.sql.chars() {
            if ch == '?' {
                index += 1;
                match self.positional.get(&index) {
                    Some(value) => buf.push_str(&value.as_sql_literal()),
                    None => buf.push('?'),
                }
            } else {
                buf.push(ch);
            }
        }
        if !self.named.is_empty() {
            buf.push_str(" {");
            for (i, (name, value)) in self.named.iter().enumerate() {
                if i > 0 {
                    buf.push_str(", ");
                }
                buf.push_str(name);
                buf.push_str(" => ");
                buf.push_str(&value.as_sql_literal());
            }
            buf.push('}');
        }
    }
}

/// What the deferred before-message step will render for the statement part.
enum RenderPlan {
    Statement(StatementSnapshot),
    Batch(Vec<StatementSnapshot>),
    Empty,
}

impl RenderPlan {
    fn render_into(&self, buf: &mut String) {
        match self {
            RenderPlan::Statement(snapshot) => snapshot.render_into(buf),
            RenderPlan::Batch(items) => {
                buf.push_str("batch of ");
                buf.push_str(&items.len().to_string());
                buf.push_str(": [");
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        buf.push_str("; ");
                    }
                    item.render_into(buf);
                }
                buf.push(']');
            }
            RenderPlan::Empty => {}
        }
    }
}

/// Per-kind behavior plugged into the shared interception state machine.
/// Defaults describe a silent pass-through kind; statement-like kinds
/// override the logging gate and the rendering hooks.
pub trait HandlerPolicy: Send {
    /// Logging gate for this call. Capability-specific; false by default.
    fn needs_logging(&self, _call: &InterceptedCall) -> bool {
        false
    }

    fn is_add_batch(&self, call: &InterceptedCall) -> bool {
        call.method().name() == "add_batch"
    }

    fn is_execute_batch(&self, call: &InterceptedCall) -> bool {
        call.method().name() == "execute_batch"
    }

    /// Observe every intercepted call before dispatch, e.g. to record bound
    /// parameters from `set_*` calls.
    fn observe(&mut self, _call: &InterceptedCall) {}

    /// Remember the current statement as a batch item for later rendering.
    fn record_batch_item(&mut self, _call: &InterceptedCall) {}

    /// Snapshot the single statement this call executes, if it has one.
    fn statement_snapshot(&self, _call: &InterceptedCall) -> Option<StatementSnapshot> {
        None
    }

    /// Snapshot the accumulated batch items.
    fn batch_snapshot(&self) -> Vec<StatementSnapshot> {
        Vec::new()
    }

    /// Post-invoke bookkeeping on the success path, e.g. clearing the batch
    /// after `execute_batch`.
    fn completed(&mut self, _call: &InterceptedCall) {}

    /// SQL text to attach when the call's result is wrapped as a prepared
    /// or callable statement.
    fn sql_hint(&self, _call: &InterceptedCall) -> Option<String> {
        None
    }
}

/// Single dispatch entry point every proxy forwards to.
pub trait CallHandler: Send {
    fn handle(&mut self, call: InterceptedCall) -> Result<CallOutput>;
}

/// The interception state machine shared by every wrapped-object kind.
///
/// Per invocation: push the ambient context, evaluate the logging gate,
/// assemble the deferred before-message, invoke the real method, re-wrap
/// nested driver objects, assemble and emit the after-message, escalate slow
/// calls, and report failures exactly once. The context guard restores the
/// previous ambient state on every exit path.
pub struct LoggingHandler<P: HandlerPolicy> {
    runtime: Arc<SpyRuntime>,
    meta: Option<Arc<LogMetaData>>,
    target: Box<dyn DriverObject>,
    policy: P,
}

impl<P: HandlerPolicy> LoggingHandler<P> {
    pub fn new(
        runtime: Arc<SpyRuntime>,
        meta: Option<Arc<LogMetaData>>,
        target: Box<dyn DriverObject>,
        policy: P,
    ) -> Self {
        Self {
            runtime,
            meta,
            target,
            policy,
        }
    }

    fn render_plan(&self, call: &InterceptedCall, is_add_batch: bool, is_execute_batch: bool) -> RenderPlan {
        let config = self.runtime.config();
        if is_execute_batch {
            if config.log_execute_batch_detail() {
                RenderPlan::Batch(self.policy.batch_snapshot())
            } else {
                RenderPlan::Empty
            }
        } else if is_add_batch {
            if config.log_add_batch_detail() {
                self.policy
                    .statement_snapshot(call)
                    .map_or(RenderPlan::Empty, RenderPlan::Statement)
            } else {
                RenderPlan::Empty
            }
        } else {
            self.policy
                .statement_snapshot(call)
                .map_or(RenderPlan::Empty, RenderPlan::Statement)
        }
    }

    fn log_after(&self, call: &InterceptedCall, elapsed: Duration, message: &mut LazyMessage) {
        let sinks = self.runtime.sinks();
        if self.runtime.config().log_detail_after_statement() {
            log_info_on(message, sinks.statement.as_ref());
        } else {
            // Condensed end message; the detailed one stays intact for the
            // slow-query channel.
            let mut condensed = LazyMessage::new();
            let qualified = call.method().qualified();
            let location = call.location();
            condensed.append_with(move |buf| {
                buf.push_str("END: ");
                buf.push_str(&qualified);
                buf.push_str(": ");
                append_location(buf, location);
                append_elapsed(buf, elapsed);
            });
            log_info_on(&mut condensed, sinks.statement.as_ref());
        }

        if elapsed >= self.runtime.config().slow_query_threshold() {
            log_info_on(message, sinks.slow_query.as_ref());
        }
    }

    fn report_failure(&self, call: &InterceptedCall, err: SpyError) -> SpyError {
        let sink = self.runtime.sinks().statement.as_ref();
        if sink.enabled(LogLevel::Error) {
            sink.log(
                LogLevel::Error,
                &format!("FAILED: {}: {}", call.method().qualified(), err),
            );
        }
        err
    }
}

impl<P: HandlerPolicy> CallHandler for LoggingHandler<P> {
    fn handle(&mut self, call: InterceptedCall) -> Result<CallOutput> {
        let _scope = context::push(self.meta.clone());

        self.policy.observe(&call);
        let is_add_batch = self.policy.is_add_batch(&call);
        let is_execute_batch = self.policy.is_execute_batch(&call);
        let mut needs_log = self.policy.needs_logging(&call);

        let config = self.runtime.config().clone();
        if is_add_batch {
            if !config.log_add_batch() {
                needs_log = false;
            }
            if config.log_execute_batch_detail() {
                self.policy.record_batch_item(&call);
            }
        }

        let mut message: Option<LazyMessage> = None;
        if needs_log {
            let mut msg = LazyMessage::new();
            let log_before = config.log_before_statement();
            let qualified = call.method().qualified();
            let plan = self.render_plan(&call, is_add_batch, is_execute_batch);
            let location = call.location();
            msg.append_with(move |buf| {
                if log_before {
                    buf.push_str("START: ");
                }
                buf.push_str(&qualified);
                buf.push_str(": ");
                plan.render_into(buf);
                append_location(buf, location);
            });
            if log_before {
                log_info_on(&mut msg, self.runtime.sinks().statement.as_ref());
            }
            message = Some(msg);
        }

        let output = match self.target.invoke(call.method(), call.args()) {
            Ok(output) => output,
            Err(err) => return Err(self.report_failure(&call, err)),
        };

        self.policy.completed(&call);

        let output = proxy::wrap(
            &self.runtime,
            &self.meta,
            output,
            self.policy.sql_hint(&call).as_deref(),
        )?;

        if let Some(mut msg) = message {
            let elapsed = call.entered().elapsed();
            let log_before = config.log_before_statement();
            msg.append_with(move |buf| {
                if log_before {
                    buf.replace_range(0.."START: ".len(), "END: ");
                }
                append_elapsed(buf, elapsed);
            });
            self.log_after(&call, elapsed, &mut msg);
        }

        Ok(output)
    }
}

fn log_info_on(message: &mut LazyMessage, sink: &dyn LogSink) {
    if sink.enabled(LogLevel::Info) {
        sink.log(LogLevel::Info, message.get());
    }
}

fn append_location(buf: &mut String, location: &'static Location<'static>) {
    buf.push_str(" at ");
    buf.push_str(location.file());
    buf.push(':');
    buf.push_str(&location.line().to_string());
}

fn append_elapsed(buf: &mut String, elapsed: Duration) {
    buf.push_str(&format!(" elapsed: {:.3} ms", elapsed.as_secs_f64() * 1000.0));
}
