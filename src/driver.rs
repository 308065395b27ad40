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
use std::fmt;

use chrono::NaiveDateTime;
use serde::Serialize;

use crate::capability::{Capability, TypeDescriptor};
use crate::errors::Result;

/// Scalar argument / result value exchanged with a wrapped driver object.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    Bytes(Vec<u8>),
    Timestamp(NaiveDateTime),
}

impl Value {
    /// Render the value as an inline SQL literal for log output. Binary
    /// payloads are base64-encoded rather than dumped raw.
    pub fn as_sql_literal(&self) -> String {
        match self {
            Value::Null => "NULL".to_string(),
            Value::Bool(v) => v.to_string(),
            Value::Int(v) => v.to_string(),
            Value::Float(v) => v.to_string(),
            Value::Text(v) => format!("'{}'", v.replace('\'', "''")),
            Value::Bytes(v) => format!("b64'{}'", base64::encode(v)),
            Value::Timestamp(v) => format!("'{}'", v.format("%Y-%m-%d %H:%M:%S%.3f")),
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(v) => Some(*v),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_sql_literal())
    }
}

/// Identity of an intercepted method: its name plus the capability that
/// declares it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MethodId {
    capability: Capability,
    name: String,
}

impl MethodId {
    pub fn new(capability: Capability, name: impl Into<String>) -> Self {
        Self {
            capability,
            name: name.into(),
        }
    }

    pub fn capability(&self) -> Capability {
        self.capability
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Fully-qualified identity used in log lines, e.g.
    /// `Statement.execute_query`.
    pub fn qualified(&self) -> String {
        format!("{}.{}", self.capability.as_str(), self.name)
    }
}

impl fmt::Display for MethodId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.capability.as_str(), self.name)
    }
}

/// Outcome of a driver call: nothing, a scalar, or a nested driver object
/// (statement, result set, connection) eligible for re-wrapping.
pub enum CallOutput {
    Unit,
    Value(Value),
    Object(Box<dyn DriverObject>),
}

impl CallOutput {
    pub fn as_value(&self) -> Option<&Value> {
        match self {
            CallOutput::Value(v) => Some(v),
            _ => None,
        }
    }

    pub fn into_object(self) -> Option<Box<dyn DriverObject>> {
        match self {
            CallOutput::Object(obj) => Some(obj),
            _ => None,
        }
    }
}

impl fmt::Debug for CallOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CallOutput::Unit => write!(f, "Unit"),
            CallOutput::Value(v) => write!(f, "Value({:?})", v),
            CallOutput::Object(obj) => write!(f, "Object({})", obj.descriptor().name()),
        }
    }
}

/// The narrow contract a concrete driver object must satisfy to be wrapped:
/// describe its declared capabilities, and invoke an arbitrary declared
/// method by identity with a given argument list.
pub trait DriverObject: Send {
    fn descriptor(&self) -> TypeDescriptor;

    fn invoke(&mut self, method: &MethodId, args: &[Value]) -> Result<CallOutput>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sql_literal_rendering() {
        assert_eq!("NULL", Value::Null.as_sql_literal());
        assert_eq!("42", Value::Int(42).as_sql_literal());
        assert_eq!("true", Value::Bool(true).as_sql_literal());
        assert_eq!("'a''b'", Value::Text("a'b".to_string()).as_sql_literal());
        assert_eq!("b64'AQI='", Value::Bytes(vec![1, 2]).as_sql_literal());
    }

    #[test]
    fn test_qualified_method_identity() {
        let method = MethodId::new(Capability::Statement, "execute_query");
        assert_eq!("Statement.execute_query", method.qualified());
    }
}
