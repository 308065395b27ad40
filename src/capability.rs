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

use dashmap::DashMap;
use indexmap::IndexSet;
use once_cell::sync::Lazy;

/// The closed set of driver capabilities a wrapped object can expose.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    Connection,
    Statement,
    PreparedStatement,
    CallableStatement,
    ResultSet,
    ConnectionSource,
}

impl Capability {
    pub fn as_str(&self) -> &'static str {
        match self {
            Capability::Connection => "Connection",
            Capability::Statement => "Statement",
            Capability::PreparedStatement => "PreparedStatement",
            Capability::CallableStatement => "CallableStatement",
            Capability::ResultSet => "ResultSet",
            Capability::ConnectionSource => "ConnectionSource",
        }
    }

    /// Direct super-capability, if any. CallableStatement is-a
    /// PreparedStatement is-a Statement; the rest stand alone.
    pub fn parent(&self) -> Option<Capability> {
        match self {
            Capability::CallableStatement => Some(Capability::PreparedStatement),
            Capability::PreparedStatement => Some(Capability::Statement),
            _ => None,
        }
    }

    /// True when an object exposing `other` is substitutable where `self`
    /// is required.
    pub fn is_assignable_from(&self, other: Capability) -> bool {
        let mut current = Some(other);
        while let Some(cap) = current {
            if cap == *self {
                return true;
            }
            current = cap.parent();
        }
        false
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One level of a concrete type's ancestor chain and the capabilities it
/// directly declares.
#[derive(Debug, Clone)]
pub struct TypeLevel {
    type_name: String,
    declared: Vec<Capability>,
}

impl TypeLevel {
    pub fn new(type_name: impl Into<String>, declared: &[Capability]) -> Self {
        Self {
            type_name: type_name.into(),
            declared: declared.to_vec(),
        }
    }

    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    pub fn declared(&self) -> &[Capability] {
        &self.declared
    }
}

/// Runtime description of a concrete driver type: its name plus the ancestor
/// chain, concrete type first, each level listing directly declared
/// capabilities. The universal root is excluded by construction.
#[derive(Debug, Clone)]
pub struct TypeDescriptor {
    name: String,
    levels: Vec<TypeLevel>,
}

impl TypeDescriptor {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            levels: Vec::new(),
        }
    }

    /// Single-level descriptor for a type without relevant ancestors.
    pub fn leaf(name: impl Into<String>, declared: &[Capability]) -> Self {
        let name = name.into();
        let level = TypeLevel::new(name.clone(), declared);
        Self {
            name,
            levels: vec![level],
        }
    }

    /// Push the next ancestor level, walking upward from the concrete type.
    pub fn level(mut self, type_name: impl Into<String>, declared: &[Capability]) -> Self {
        self.levels.push(TypeLevel::new(type_name, declared));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn levels(&self) -> &[TypeLevel] {
        &self.levels
    }

    /// True when the described type satisfies `required` at any level.
    pub fn is(&self, required: Capability) -> bool {
        self.levels
            .iter()
            .flat_map(|level| level.declared().iter())
            .any(|declared| required.is_assignable_from(*declared))
    }
}

/// Walk the ancestor chain and collect every declared capability assignable
/// to `required`, deduplicated in first-seen order. An empty result is a
/// valid degenerate outcome; rejecting it is the proxy factory's job.
pub fn compatible_capabilities(
    descriptor: &TypeDescriptor,
    required: Capability,
) -> IndexSet<Capability> {
    let mut compatible = IndexSet::new();
    for level in descriptor.levels() {
        for declared in level.declared() {
            if required.is_assignable_from(*declared) {
                compatible.insert(*declared);
            }
        }
    }
    compatible
}

static RESOLVER_CACHE: Lazy<DashMap<(String, Capability), Vec<Capability>>> =
    Lazy::new(DashMap::new);

/// Cached resolver keyed by (type name, required capability). The pair is
/// immutable for a process lifetime, so entries never need invalidation.
pub fn compatible_capabilities_cached(
    descriptor: &TypeDescriptor,
    required: Capability,
) -> IndexSet<Capability> {
    let key = (descriptor.name().to_string(), required);
    if let Some(hit) = RESOLVER_CACHE.get(&key) {
        return hit.iter().copied().collect();
    }
    let resolved = compatible_capabilities(descriptor, required);
    RESOLVER_CACHE.insert(key, resolved.iter().copied().collect());
    resolved
}
