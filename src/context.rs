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
use std::cell::RefCell;
use std::sync::Arc;

use indexmap::IndexMap;
use serde::Serialize;
use uuid::Uuid;

/// Correlation context tagged onto every log line emitted while a wrapped
/// call is in flight. Owned by the caller, handed by reference to every
/// handler constructed from it, immutable from the handler's perspective.
#[derive(Debug, Clone, Serialize)]
pub struct LogMetaData {
    correlation_id: Uuid,
    entries: IndexMap<String, String>,
}

impl LogMetaData {
    pub fn new() -> Self {
        Self {
            correlation_id: Uuid::new_v4(),
            entries: IndexMap::new(),
        }
    }

    pub fn with_entry(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.entries.insert(key.into(), value.into());
        self
    }

    pub fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }

    pub fn entries(&self) -> &IndexMap<String, String> {
        &self.entries
    }
}

impl Default for LogMetaData {
    fn default() -> Self {
        Self::new()
    }
}

thread_local! {
    static CURRENT: RefCell<Option<Arc<LogMetaData>>> = RefCell::new(None);
}

/// Restores the previous ambient context when dropped, on every exit path
/// including the error path.
pub struct ContextGuard {
    previous: Option<Option<Arc<LogMetaData>>>,
}

impl Drop for ContextGuard {
    fn drop(&mut self) {
        if let Some(previous) = self.previous.take() {
            CURRENT.with(|current| *current.borrow_mut() = previous);
        }
    }
}

/// Install `meta` as the ambient context for the current thread of control.
/// A `None` meta leaves whatever context is already active untouched.
pub fn push(meta: Option<Arc<LogMetaData>>) -> ContextGuard {
    match meta {
        Some(meta) => {
            let previous = CURRENT.with(|current| current.replace(Some(meta)));
            ContextGuard {
                previous: Some(previous),
            }
        }
        None => ContextGuard { previous: None },
    }
}

pub fn current() -> Option<Arc<LogMetaData>> {
    CURRENT.with(|current| current.borrow().clone())
}

/// The active context rendered as a JSON object, for sink line suffixes.
pub fn current_json() -> Option<String> {
    current().map(|meta| serde_json::to_string(&*meta).unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_and_restore() {
        assert!(current().is_none());
        let outer = Arc::new(LogMetaData::new().with_entry("conn", "1"));
        {
            let _outer_guard = push(Some(outer.clone()));
            assert_eq!(
                outer.correlation_id(),
                current().map(|m| m.correlation_id()).unwrap()
            );

            let inner = Arc::new(LogMetaData::new().with_entry("stmt", "2"));
            {
                let _inner_guard = push(Some(inner.clone()));
                assert_eq!(
                    inner.correlation_id(),
                    current().map(|m| m.correlation_id()).unwrap()
                );
            }
            assert_eq!(
                outer.correlation_id(),
                current().map(|m| m.correlation_id()).unwrap()
            );
        }
        assert!(current().is_none());
    }

    #[test]
    fn test_none_push_keeps_active_context() {
        let meta = Arc::new(LogMetaData::new());
        let _guard = push(Some(meta.clone()));
        {
            let _noop = push(None);
            assert!(current().is_some());
        }
        assert!(current().is_some());
    }

    #[test]
    fn test_current_json_includes_entries() {
        let meta = Arc::new(LogMetaData::new().with_entry("conn", "7"));
        let _guard = push(Some(meta));
        let json = current_json().unwrap();
        assert!(json.contains("\"conn\":\"7\""));
        assert!(json.contains("correlation_id"));
    }
}
