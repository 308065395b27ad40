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
use crate::driver::Value;
use crate::handler::{HandlerPolicy, InterceptedCall};

/// Connection kind: silent itself, but statements it creates are re-wrapped
/// with the SQL text taken from the creating call.
#[derive(Default)]
pub struct ConnectionPolicy;

impl HandlerPolicy for ConnectionPolicy {
    fn sql_hint(&self, call: &InterceptedCall) -> Option<String> {
        match call.method().name() {
            "prepare_statement" | "prepare_call" => call
                .args()
                .first()
                .and_then(Value::as_text)
                .map(str::to_string),
            _ => None,
        }
    }
}

/// Result set kind: silent pass-through; nested objects still get wrapped.
#[derive(Default)]
pub struct ResultSetPolicy;

impl HandlerPolicy for ResultSetPolicy {}

/// Generic connection-source kind (data source, pooled or XA connection):
/// silent, exists so `get_connection` results come back wrapped.
#[derive(Default)]
pub struct ConnectionSourcePolicy;

impl HandlerPolicy for ConnectionSourcePolicy {}
