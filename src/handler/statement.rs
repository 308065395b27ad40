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

use indexmap::IndexMap;

use crate::driver::Value;
use crate::handler::{HandlerPolicy, InterceptedCall, StatementSnapshot};

/// Execution entry points that warrant a log record. `add_batch` is included
/// so the batch configuration switches get a say.
fn is_logged_method(name: &str) -> bool {
    name.starts_with("execute") || name == "add_batch"
}

/// Plain statement kind: the SQL text travels with each execute call.
#[derive(Default)]
pub struct StatementPolicy {
    batch: Vec<StatementSnapshot>,
}

impl HandlerPolicy for StatementPolicy {
    fn needs_logging(&self, call: &InterceptedCall) -> bool {
        is_logged_method(call.method().name())
    }

    fn record_batch_item(&mut self, call: &InterceptedCall) {
        if let Some(snapshot) = self.statement_snapshot(call) {
            self.batch.push(snapshot);
        }
    }

    fn statement_snapshot(&self, call: &InterceptedCall) -> Option<StatementSnapshot> {
        call.args()
            .first()
            .and_then(Value::as_text)
            .map(StatementSnapshot::new)
    }

    fn batch_snapshot(&self) -> Vec<StatementSnapshot> {
        self.batch.clone()
    }

    fn completed(&mut self, call: &InterceptedCall) {
        if matches!(call.method().name(), "execute_batch" | "clear_batch") {
            self.batch.clear();
        }
    }
}

/// Prepared statement kind: the SQL text is fixed at creation and parameters
/// arrive through intercepted `set_*` calls (1-based index, value).
pub struct PreparedStatementPolicy {
    sql: String,
    positional: BTreeMap<usize, Value>,
    batch: Vec<StatementSnapshot>,
}

impl PreparedStatementPolicy {
    pub fn new(sql: impl Into<String>) -> Self {
        Self {
            sql: sql.into(),
            positional: BTreeMap::new(),
            batch: Vec::new(),
        }
    }

    fn snapshot(&self) -> StatementSnapshot {
        StatementSnapshot::new(&self.sql).with_positional(self.positional.clone())
    }
}

impl HandlerPolicy for PreparedStatementPolicy {
    fn needs_logging(&self, call: &InterceptedCall) -> bool {
        is_logged_method(call.method().name())
    }

    fn observe(&mut self, call: &InterceptedCall) {
        let name = call.method().name();
        if name == "clear_parameters" {
            self.positional.clear();
        } else if name.starts_with("set_") && call.args().len() == 2 {
            if let Some(index) = call.args()[0].as_int() {
                if index > 0 {
                    self.positional.insert(index as usize, call.args()[1].clone());
                }
            }
        }
    }

    fn record_batch_item(&mut self, _call: &InterceptedCall) {
        self.batch.push(self.snapshot());
    }

    fn statement_snapshot(&self, _call: &InterceptedCall) -> Option<StatementSnapshot> {
        Some(self.snapshot())
    }

    fn batch_snapshot(&self) -> Vec<StatementSnapshot> {
        self.batch.clone()
    }

    fn completed(&mut self, call: &InterceptedCall) {
        if matches!(call.method().name(), "execute_batch" | "clear_batch") {
            self.batch.clear();
        }
    }
}

/// Callable statement kind: prepared behavior plus named parameters bound
/// through `set_named(name, value)`.
pub struct CallableStatementPolicy {
    inner: PreparedStatementPolicy,
    named: IndexMap<String, Value>,
}

impl CallableStatementPolicy {
    pub fn new(sql: impl Into<String>) -> Self {
        Self {
            inner: PreparedStatementPolicy::new(sql),
            named: IndexMap::new(),
        }
    }

    fn snapshot(&self) -> StatementSnapshot {
        self.inner.snapshot().with_named(
            self.named
                .iter()
                .map(|(name, value)| (name.clone(), value.clone()))
                .collect(),
        )
    }
}

impl HandlerPolicy for CallableStatementPolicy {
    fn needs_logging(&self, call: &InterceptedCall) -> bool {
        is_logged_method(call.method().name())
    }

    fn observe(&mut self, call: &InterceptedCall) {
        let name = call.method().name();
        if name == "set_named" && call.args().len() == 2 {
            if let Some(key) = call.args()[0].as_text() {
                self.named.insert(key.to_string(), call.args()[1].clone());
            }
            return;
        }
        if name == "clear_parameters" {
            self.named.clear();
        }
        self.inner.observe(call);
    }

    fn record_batch_item(&mut self, _call: &InterceptedCall) {
        let snapshot = self.snapshot();
        self.inner.batch.push(snapshot);
    }

    fn statement_snapshot(&self, _call: &InterceptedCall) -> Option<StatementSnapshot> {
        Some(self.snapshot())
    }

    fn batch_snapshot(&self) -> Vec<StatementSnapshot> {
        self.inner.batch.clone()
    }

    fn completed(&mut self, call: &InterceptedCall) {
        self.inner.completed(call);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capability::Capability;
    use crate::driver::MethodId;

    fn call(capability: Capability, name: &str, args: Vec<Value>) -> InterceptedCall {
        InterceptedCall::new(MethodId::new(capability, name), args)
    }

    #[test]
    fn test_statement_gate() {
        let policy = StatementPolicy::default();
        let executes = call(
            Capability::Statement,
            "execute_query",
            vec![Value::Text("select 1".to_string())],
        );
        let closes = call(Capability::Statement, "close", vec![]);
        assert!(policy.needs_logging(&executes));
        assert!(!policy.needs_logging(&closes));
    }

    #[test]
    fn test_statement_batch_accumulates_and_clears() {
        let mut policy = StatementPolicy::default();
        let add = call(
            Capability::Statement,
            "add_batch",
            vec![Value::Text("insert into t values (1)".to_string())],
        );
        policy.record_batch_item(&add);
        assert_eq!(1, policy.batch_snapshot().len());

        let execute = call(Capability::Statement, "execute_batch", vec![]);
        policy.completed(&execute);
        assert!(policy.batch_snapshot().is_empty());
    }

    #[test]
    fn test_prepared_records_positional_parameters() {
        let mut policy = PreparedStatementPolicy::new("select * from t where id = ?");
        policy.observe(&call(
            Capability::PreparedStatement,
            "set_int",
            vec![Value::Int(1), Value::Int(42)],
        ));

        let execute = call(Capability::PreparedStatement, "execute_query", vec![]);
        let mut buf = String::new();
        policy.statement_snapshot(&execute).unwrap().render_into(&mut buf);
        assert_eq!("select * from t where id = 42", buf);

        policy.observe(&call(
            Capability::PreparedStatement,
            "clear_parameters",
            vec![],
        ));
        let mut buf = String::new();
        policy.statement_snapshot(&execute).unwrap().render_into(&mut buf);
        assert_eq!("select * from t where id = ?", buf);
    }

    #[test]
    fn test_callable_records_named_parameters() {
        let mut policy = CallableStatementPolicy::new("call audit(?)");
        policy.observe(&call(
            Capability::CallableStatement,
            "set_named",
            vec![
                Value::Text("who".to_string()),
                Value::Text("sys".to_string()),
            ],
        ));

        let execute = call(Capability::CallableStatement, "execute", vec![]);
        let mut buf = String::new();
        policy.statement_snapshot(&execute).unwrap().render_into(&mut buf);
        assert_eq!("call audit(?) {who => 'sys'}", buf);
    }

    #[test]
    fn test_prepared_batch_snapshots_current_binding() {
        let mut policy = PreparedStatementPolicy::new("insert into t values (?)");
        policy.observe(&call(
            Capability::PreparedStatement,
            "set_int",
            vec![Value::Int(1), Value::Int(5)],
        ));
        let add = call(Capability::PreparedStatement, "add_batch", vec![]);
        policy.record_batch_item(&add);

        policy.observe(&call(
            Capability::PreparedStatement,
            "set_int",
            vec![Value::Int(1), Value::Int(6)],
        ));
        policy.record_batch_item(&add);

        let rendered: Vec<String> = policy
            .batch_snapshot()
            .iter()
            .map(|snapshot| {
                let mut buf = String::new();
                snapshot.render_into(&mut buf);
                buf
            })
            .collect();
        assert_eq!(
            vec![
                "insert into t values (5)".to_string(),
                "insert into t values (6)".to_string()
            ],
            rendered
        );
    }
}
