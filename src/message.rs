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

type Step = Box<dyn FnOnce(&mut String) + Send>;

/// Deferred log message builder.
///
/// Appended steps are queued and replayed exactly once when `get` is called,
/// over a buffer seeded with the previously materialized string. Steps get
/// mutable access to the buffer, so a later step may rewrite a region written
/// by an earlier one (the before/after call phases share one message and the
/// after phase edits the `START: ` prefix in place).
pub struct LazyMessage {
    steps: Vec<Step>,
    result: String,
    dirty: bool,
}

impl LazyMessage {
    pub fn new() -> Self {
        Self {
            steps: Vec::new(),
            result: String::new(),
            dirty: false,
        }
    }

    /// Queue a plain text append.
    pub fn append(&mut self, text: impl Into<String>) -> &mut Self {
        let text = text.into();
        self.append_with(move |buf| buf.push_str(&text))
    }

    /// Queue an arbitrary deferred mutation. The closure body does not run
    /// until `get` is called.
    pub fn append_with<F>(&mut self, step: F) -> &mut Self
    where
        F: FnOnce(&mut String) + Send + 'static,
    {
        self.steps.push(Box::new(step));
        self.dirty = true;
        self
    }

    /// Materialize the message. Pending steps are replayed once and the
    /// result is cached; repeated calls without an intervening append return
    /// the cached string with no work performed.
    pub fn get(&mut self) -> &str {
        if self.dirty {
            let mut buf = std::mem::take(&mut self.result);
            for step in self.steps.drain(..) {
                step(&mut buf);
            }
            self.result = buf;
            self.dirty = false;
        }
        &self.result
    }
}

impl Default for LazyMessage {
    fn default() -> Self {
        Self::new()
    }
}
