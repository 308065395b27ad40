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
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use indexmap::IndexSet;
use once_cell::sync::Lazy;

use crate::capability::{compatible_capabilities_cached, Capability, TypeDescriptor};
use crate::context::LogMetaData;
use crate::driver::{CallOutput, DriverObject, MethodId, Value};
use crate::errors::{Result, SpyError};
use crate::handler::{
    CallHandler, CallableStatementPolicy, ConnectionPolicy, ConnectionSourcePolicy,
    InterceptedCall, LoggingHandler, PreparedStatementPolicy, ResultSetPolicy, StatementPolicy,
};
use crate::spy::SpyRuntime;

/// A wrapped driver object: the resolved capability set plus the call
/// handler every invocation is forwarded to. Pure dispatch indirection, no
/// logging or business logic of its own.
pub struct SpyProxy {
    name: String,
    capabilities: IndexSet<Capability>,
    handler: Box<dyn CallHandler>,
}

impl SpyProxy {
    /// Name of the concrete type behind the proxy.
    pub fn target_name(&self) -> &str {
        &self.name
    }

    /// The exposed capability set, in resolver order.
    pub fn capabilities(&self) -> &IndexSet<Capability> {
        &self.capabilities
    }

    /// Forward one invocation to the handler. Fails when the method's
    /// declaring capability is not satisfied by the exposed set.
    #[track_caller]
    pub fn call(&mut self, method: MethodId, args: Vec<Value>) -> Result<CallOutput> {
        if !self
            .capabilities
            .iter()
            .any(|cap| method.capability().is_assignable_from(*cap))
        {
            return Err(SpyError::UnsupportedMethod(format!(
                "{} is outside the capability set of {}",
                method.qualified(),
                self.name
            )));
        }
        self.handler.handle(InterceptedCall::new(method, args))
    }
}

impl DriverObject for SpyProxy {
    fn descriptor(&self) -> TypeDescriptor {
        let declared: Vec<Capability> = self.capabilities.iter().copied().collect();
        TypeDescriptor::leaf(format!("{}Proxy", self.name), &declared)
    }

    fn invoke(&mut self, method: &MethodId, args: &[Value]) -> Result<CallOutput> {
        self.call(method.clone(), args.to_vec())
    }
}

/// Resolve the capability set a proxy for `descriptor` must expose to stay
/// substitutable for `required`, and bind it to `handler`. An empty set is
/// an integration defect and is surfaced, never degraded to a no-op wrapper.
pub fn proxy_for_compatible(
    descriptor: &TypeDescriptor,
    required: Capability,
    handler: Box<dyn CallHandler>,
) -> Result<SpyProxy> {
    let capabilities = compatible_capabilities_cached(descriptor, required);
    if capabilities.is_empty() {
        return Err(SpyError::IncompatibleProxy(format!(
            "{} declares no capability compatible with {}",
            descriptor.name(),
            required
        )));
    }
    Ok(SpyProxy {
        name: descriptor.name().to_string(),
        capabilities,
        handler,
    })
}

pub type PlainHandlerCreator = Arc<
    dyn Fn(Arc<SpyRuntime>, Option<Arc<LogMetaData>>, Box<dyn DriverObject>) -> Box<dyn CallHandler>
        + Send
        + Sync,
>;

pub type SqlHandlerCreator = Arc<
    dyn Fn(
            Arc<SpyRuntime>,
            Option<Arc<LogMetaData>>,
            Box<dyn DriverObject>,
            String,
        ) -> Box<dyn CallHandler>
        + Send
        + Sync,
>;

/// The pluggable per-kind handler factories. Process-wide; replace-on-write
/// through the `set_*_handler_creator` functions, to be done once at startup
/// before wrapping begins. Proxies created earlier keep their old handlers.
pub struct HandlerRegistry {
    statement: PlainHandlerCreator,
    prepared_statement: SqlHandlerCreator,
    callable_statement: SqlHandlerCreator,
    connection: PlainHandlerCreator,
    result_set: PlainHandlerCreator,
    connection_source: PlainHandlerCreator,
}

impl Default for HandlerRegistry {
    fn default() -> Self {
        Self {
            statement: Arc::new(|runtime, meta, target| {
                Box::new(LoggingHandler::new(
                    runtime,
                    meta,
                    target,
                    StatementPolicy::default(),
                ))
            }),
            prepared_statement: Arc::new(|runtime, meta, target, sql| {
                Box::new(LoggingHandler::new(
                    runtime,
                    meta,
                    target,
                    PreparedStatementPolicy::new(sql),
                ))
            }),
            callable_statement: Arc::new(|runtime, meta, target, sql| {
                Box::new(LoggingHandler::new(
                    runtime,
                    meta,
                    target,
                    CallableStatementPolicy::new(sql),
                ))
            }),
            connection: Arc::new(|runtime, meta, target| {
                Box::new(LoggingHandler::new(
                    runtime,
                    meta,
                    target,
                    ConnectionPolicy::default(),
                ))
            }),
            result_set: Arc::new(|runtime, meta, target| {
                Box::new(LoggingHandler::new(
                    runtime,
                    meta,
                    target,
                    ResultSetPolicy::default(),
                ))
            }),
            connection_source: Arc::new(|runtime, meta, target| {
                Box::new(LoggingHandler::new(
                    runtime,
                    meta,
                    target,
                    ConnectionSourcePolicy::default(),
                ))
            }),
        }
    }
}

static REGISTRY: Lazy<RwLock<HandlerRegistry>> =
    Lazy::new(|| RwLock::new(HandlerRegistry::default()));

fn registry() -> RwLockReadGuard<'static, HandlerRegistry> {
    REGISTRY.read().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn registry_mut() -> RwLockWriteGuard<'static, HandlerRegistry> {
    REGISTRY
        .write()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
}

pub fn set_statement_handler_creator(creator: PlainHandlerCreator) {
    registry_mut().statement = creator;
}

pub fn set_prepared_statement_handler_creator(creator: SqlHandlerCreator) {
    registry_mut().prepared_statement = creator;
}

pub fn set_callable_statement_handler_creator(creator: SqlHandlerCreator) {
    registry_mut().callable_statement = creator;
}

pub fn set_connection_handler_creator(creator: PlainHandlerCreator) {
    registry_mut().connection = creator;
}

pub fn set_result_set_handler_creator(creator: PlainHandlerCreator) {
    registry_mut().result_set = creator;
}

pub fn set_connection_source_handler_creator(creator: PlainHandlerCreator) {
    registry_mut().connection_source = creator;
}

pub fn wrap_by_statement_proxy(
    runtime: Arc<SpyRuntime>,
    meta: Option<Arc<LogMetaData>>,
    target: Box<dyn DriverObject>,
) -> Result<SpyProxy> {
    let descriptor = target.descriptor();
    // Clone the creator out of the guard so a creator that wraps nested
    // objects does not re-enter the registry lock.
    let creator = registry().statement.clone();
    let handler = creator(runtime, meta, target);
    proxy_for_compatible(&descriptor, Capability::Statement, handler)
}

pub fn wrap_by_prepared_statement_proxy(
    runtime: Arc<SpyRuntime>,
    meta: Option<Arc<LogMetaData>>,
    target: Box<dyn DriverObject>,
    sql: String,
) -> Result<SpyProxy> {
    let descriptor = target.descriptor();
    let creator = registry().prepared_statement.clone();
    let handler = creator(runtime, meta, target, sql);
    proxy_for_compatible(&descriptor, Capability::PreparedStatement, handler)
}

pub fn wrap_by_callable_statement_proxy(
    runtime: Arc<SpyRuntime>,
    meta: Option<Arc<LogMetaData>>,
    target: Box<dyn DriverObject>,
    sql: String,
) -> Result<SpyProxy> {
    let descriptor = target.descriptor();
    let creator = registry().callable_statement.clone();
    let handler = creator(runtime, meta, target, sql);
    proxy_for_compatible(&descriptor, Capability::CallableStatement, handler)
}

pub fn wrap_by_connection_proxy(
    runtime: Arc<SpyRuntime>,
    meta: Option<Arc<LogMetaData>>,
    target: Box<dyn DriverObject>,
) -> Result<SpyProxy> {
    let descriptor = target.descriptor();
    let creator = registry().connection.clone();
    let handler = creator(runtime, meta, target);
    proxy_for_compatible(&descriptor, Capability::Connection, handler)
}

pub fn wrap_by_result_set_proxy(
    runtime: Arc<SpyRuntime>,
    meta: Option<Arc<LogMetaData>>,
    target: Box<dyn DriverObject>,
) -> Result<SpyProxy> {
    let descriptor = target.descriptor();
    let creator = registry().result_set.clone();
    let handler = creator(runtime, meta, target);
    proxy_for_compatible(&descriptor, Capability::ResultSet, handler)
}

pub fn wrap_by_connection_source_proxy(
    runtime: Arc<SpyRuntime>,
    target: Box<dyn DriverObject>,
) -> Result<SpyProxy> {
    let descriptor = target.descriptor();
    let creator = registry().connection_source.clone();
    let handler = creator(runtime, None, target);
    proxy_for_compatible(&descriptor, Capability::ConnectionSource, handler)
}

/// Type-directed wrap dispatcher: classify a call result by its runtime
/// capability, fixed precedence, first match wins. Plain values and
/// unclassified objects pass through unchanged. Prepared and callable wraps
/// carry the SQL text from the creating call.
pub fn wrap(
    runtime: &Arc<SpyRuntime>,
    meta: &Option<Arc<LogMetaData>>,
    output: CallOutput,
    sql_hint: Option<&str>,
) -> Result<CallOutput> {
    let target = match output {
        CallOutput::Object(target) => target,
        other => return Ok(other),
    };

    let descriptor = target.descriptor();
    let wrapped: Box<dyn DriverObject> = if descriptor.is(Capability::Connection) {
        Box::new(wrap_by_connection_proxy(
            runtime.clone(),
            meta.clone(),
            target,
        )?)
    } else if descriptor.is(Capability::CallableStatement) {
        Box::new(wrap_by_callable_statement_proxy(
            runtime.clone(),
            meta.clone(),
            target,
            sql_hint.unwrap_or_default().to_string(),
        )?)
    } else if descriptor.is(Capability::PreparedStatement) {
        Box::new(wrap_by_prepared_statement_proxy(
            runtime.clone(),
            meta.clone(),
            target,
            sql_hint.unwrap_or_default().to_string(),
        )?)
    } else if descriptor.is(Capability::Statement) {
        Box::new(wrap_by_statement_proxy(runtime.clone(), meta.clone(), target)?)
    } else if descriptor.is(Capability::ResultSet) {
        Box::new(wrap_by_result_set_proxy(
            runtime.clone(),
            meta.clone(),
            target,
        )?)
    } else {
        target
    };

    Ok(CallOutput::Object(wrapped))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::Result;

    struct EchoHandler {
        reply: i64,
    }

    impl CallHandler for EchoHandler {
        fn handle(&mut self, _call: InterceptedCall) -> Result<CallOutput> {
            Ok(CallOutput::Value(Value::Int(self.reply)))
        }
    }

    fn statement_descriptor() -> TypeDescriptor {
        TypeDescriptor::leaf("ProxyTestStatement", &[Capability::Statement])
    }

    #[test]
    fn test_proxy_forwards_and_returns_handler_result() {
        let mut proxy = proxy_for_compatible(
            &statement_descriptor(),
            Capability::Statement,
            Box::new(EchoHandler { reply: 7 }),
        )
        .unwrap();

        let output = proxy
            .call(
                MethodId::new(Capability::Statement, "execute_update"),
                vec![Value::Text("update t set a = 1".to_string())],
            )
            .unwrap();
        assert_eq!(Some(&Value::Int(7)), output.as_value());
    }

    #[test]
    fn test_empty_capability_set_is_surfaced() {
        let descriptor = TypeDescriptor::leaf("ProxyTestResultSet", &[Capability::ResultSet]);
        let result = proxy_for_compatible(
            &descriptor,
            Capability::Statement,
            Box::new(EchoHandler { reply: 0 }),
        );
        assert!(matches!(result, Err(SpyError::IncompatibleProxy(_))));
    }

    #[test]
    fn test_method_outside_capability_set_is_rejected() {
        let mut proxy = proxy_for_compatible(
            &statement_descriptor(),
            Capability::Statement,
            Box::new(EchoHandler { reply: 0 }),
        )
        .unwrap();

        let result = proxy.call(MethodId::new(Capability::Connection, "commit"), vec![]);
        assert!(matches!(result, Err(SpyError::UnsupportedMethod(_))));
    }

    // Serializes the tests that rebind the global statement creator.
    static REGISTRY_TEST_LOCK: Lazy<std::sync::Mutex<()>> =
        Lazy::new(|| std::sync::Mutex::new(()));

    #[test]
    fn test_registry_replacement_is_last_write_wins() {
        use crate::config::LoggingConfig;
        use crate::sink::Sinks;
        use std::sync::atomic::{AtomicUsize, Ordering};

        let _lock = REGISTRY_TEST_LOCK.lock().unwrap();
        static CREATED: AtomicUsize = AtomicUsize::new(0);

        struct SilentStatement;
        impl DriverObject for SilentStatement {
            fn descriptor(&self) -> TypeDescriptor {
                TypeDescriptor::leaf("SilentStatement", &[Capability::Statement])
            }

            fn invoke(&mut self, _method: &MethodId, _args: &[Value]) -> Result<CallOutput> {
                Ok(CallOutput::Unit)
            }
        }

        // Same behavior as the default creator, plus a creation counter.
        set_statement_handler_creator(Arc::new(|runtime, meta, target| {
            CREATED.fetch_add(1, Ordering::SeqCst);
            Box::new(LoggingHandler::new(
                runtime,
                meta,
                target,
                StatementPolicy::default(),
            ))
        }));

        let runtime = Arc::new(SpyRuntime::new(LoggingConfig::default(), Sinks::default()));
        let proxy = wrap_by_statement_proxy(runtime, None, Box::new(SilentStatement)).unwrap();
        assert!(proxy.capabilities().contains(&Capability::Statement));
        assert!(CREATED.load(Ordering::SeqCst) >= 1);

        // Restore the default binding; proxies created above keep theirs.
        set_statement_handler_creator(Arc::new(|runtime, meta, target| {
            Box::new(LoggingHandler::new(
                runtime,
                meta,
                target,
                StatementPolicy::default(),
            ))
        }));
    }

    #[test]
    fn test_creator_may_wrap_nested_objects_without_holding_the_registry() {
        use crate::config::LoggingConfig;
        use crate::sink::Sinks;

        let _lock = REGISTRY_TEST_LOCK.lock().unwrap();

        struct NestedResultSet;
        impl DriverObject for NestedResultSet {
            fn descriptor(&self) -> TypeDescriptor {
                TypeDescriptor::leaf("NestedResultSet", &[Capability::ResultSet])
            }

            fn invoke(&mut self, _method: &MethodId, _args: &[Value]) -> Result<CallOutput> {
                Ok(CallOutput::Unit)
            }
        }

        struct PlainStatement;
        impl DriverObject for PlainStatement {
            fn descriptor(&self) -> TypeDescriptor {
                TypeDescriptor::leaf("PlainStatement", &[Capability::Statement])
            }

            fn invoke(&mut self, _method: &MethodId, _args: &[Value]) -> Result<CallOutput> {
                Ok(CallOutput::Unit)
            }
        }

        // A creator that itself wraps a nested object goes back through the
        // registry. The registry lock must not still be held at that point.
        set_statement_handler_creator(Arc::new(|runtime, meta, target| {
            let nested =
                wrap_by_result_set_proxy(runtime.clone(), meta.clone(), Box::new(NestedResultSet))
                    .unwrap();
            assert!(nested.capabilities().contains(&Capability::ResultSet));
            Box::new(LoggingHandler::new(
                runtime,
                meta,
                target,
                StatementPolicy::default(),
            ))
        }));

        let runtime = Arc::new(SpyRuntime::new(LoggingConfig::default(), Sinks::default()));
        let proxy = wrap_by_statement_proxy(runtime, None, Box::new(PlainStatement)).unwrap();
        assert!(proxy.capabilities().contains(&Capability::Statement));

        set_statement_handler_creator(Arc::new(|runtime, meta, target| {
            Box::new(LoggingHandler::new(
                runtime,
                meta,
                target,
                StatementPolicy::default(),
            ))
        }));
    }

    #[test]
    fn test_sub_capability_satisfies_declaring_capability() {
        let descriptor = TypeDescriptor::leaf(
            "ProxyTestCallableOnly",
            &[Capability::CallableStatement],
        );
        let mut proxy = proxy_for_compatible(
            &descriptor,
            Capability::CallableStatement,
            Box::new(EchoHandler { reply: 1 }),
        )
        .unwrap();

        // A method declared on Statement is reachable through the callable
        // capability.
        let output = proxy.call(MethodId::new(Capability::Statement, "close"), vec![]);
        assert!(output.is_ok());
    }
}
