// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The structured error envelope that crosses RPC boundaries (`spec.md`
//! §4.1, §7).
//!
//! Every boundary (core, connector, execution, storage, federation,
//! platform, query-parser) declares its own `thiserror` enum with
//! [`define_errors!`] and converts into [`MaxError`] at the boundary. The
//! envelope itself — `{code, message, props, facets}` — is a flat,
//! serializable struct; `facets` drive recovery decisions, `code` drives
//! presentation.

use std::collections::BTreeMap;
use std::fmt;

use serde_json::Value;

/// A marker or data facet attached to a [`MaxError`].
///
/// Marker facets (`NotFound`, `BadInput`, …) carry no data of their own;
/// data facets (`HasEntityRef`, …) signal that a named prop is present and
/// typed, but the prop itself still lives in [`MaxError::props`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Facet {
    NotFound,
    BadInput,
    NotSupported,
    NotImplemented,
    InvariantViolated,
    HasEntityRef,
    HasLoaderName,
    HasConnector,
    HasEntityField,
}

impl fmt::Display for Facet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Facet::NotFound => "not_found",
            Facet::BadInput => "bad_input",
            Facet::NotSupported => "not_supported",
            Facet::NotImplemented => "not_implemented",
            Facet::InvariantViolated => "invariant_violated",
            Facet::HasEntityRef => "has_entity_ref",
            Facet::HasLoaderName => "has_loader_name",
            Facet::HasConnector => "has_connector",
            Facet::HasEntityField => "has_entity_field",
        };
        write!(f, "{}", s)
    }
}

/// The wire form of any Max error: `{code, message, props, facets}`.
///
/// Crosses the wire unchanged (`spec.md` §4.1) — intermediate nodes never
/// wrap or rewrap it; they may annotate by constructing a *new* error that
/// carries the original as a `cause` prop.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct MaxError {
    /// Namespaced string, e.g. `rpc.unknown_target`, `execution.task_not_found`.
    pub code: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub props: BTreeMap<String, Value>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub facets: Vec<Facet>,
}

impl MaxError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self { code: code.into(), message: message.into(), props: BTreeMap::new(), facets: Vec::new() }
    }

    pub fn with_prop(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.props.insert(key.into(), value.into());
        self
    }

    pub fn with_facet(mut self, facet: Facet) -> Self {
        if !self.facets.contains(&facet) {
            self.facets.push(facet);
        }
        self
    }

    /// Wrap `self` as the `cause` prop of a new error, per the
    /// never-rewrap annotation policy (`spec.md` §4.1).
    pub fn annotate(self, code: impl Into<String>, message: impl Into<String>) -> Self {
        let cause = serde_json::to_value(&self).unwrap_or(Value::Null);
        MaxError::new(code, message).with_prop("cause", cause)
    }

    pub fn has(&self, facet: Facet) -> bool {
        self.facets.contains(&facet)
    }
}

impl fmt::Display for MaxError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

impl std::error::Error for MaxError {}

/// Test facet membership on any error convertible to [`MaxError`] by
/// reference. Mirrors `spec.md`'s `has(err, facet)`.
pub fn has(err: &MaxError, facet: Facet) -> bool {
    err.has(facet)
}

/// Declare a boundary's error enum: a `thiserror`-derived type whose
/// variants each map to one namespaced `code` and carry a fixed facet
/// list, plus a `From<Enum> for MaxError` conversion.
///
/// ```ignore
/// define_errors! {
///     pub enum ExecutionError as "execution" {
///         TaskNotFound { task_id: String } => "task_not_found",
///             "task {task_id} not found", [NotFound, HasEntityRef];
///     }
/// }
/// ```
#[macro_export]
macro_rules! define_errors {
    (
        $(#[$enum_meta:meta])*
        pub enum $name:ident as $boundary:literal {
            $(
                $(#[$variant_meta:meta])*
                $variant:ident $( { $($field:ident : $ty:ty),* $(,)? } )? => $code:literal,
                $message:literal, [ $($facet:ident),* $(,)? ];
            )*
        }
    ) => {
        $(#[$enum_meta])*
        #[derive(Debug, Clone, thiserror::Error)]
        pub enum $name {
            $(
                $(#[$variant_meta])*
                #[error($message)]
                $variant $( { $($field: $ty),* } )?,
            )*
        }

        impl From<$name> for $crate::error::MaxError {
            fn from(err: $name) -> Self {
                let message = err.to_string();
                match err {
                    $(
                        $name::$variant $( { $($field),* } )? => {
                            #[allow(unused_mut)]
                            let mut out = $crate::error::MaxError::new(
                                concat!($boundary, ".", $code),
                                message,
                            );
                            $(
                                out = out.with_facet($crate::error::Facet::$facet);
                            )*
                            $($(
                                out = out.with_prop(
                                    stringify!($field),
                                    serde_json::json!($field),
                                );
                            )*)?
                            out
                        }
                    )*
                }
            }
        }
    };
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
