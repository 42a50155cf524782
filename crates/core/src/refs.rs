// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Canonical references to entity instances (`spec.md` §3, testable
//! property 1).
//!
//! A [`Ref`] names one entity instance by type and id, tagged with the
//! [`Scope`] it was materialized at. [`RefKey`] is its canonical string
//! form, used as a storage key and as the wire representation of a
//! reference crossing an RPC boundary.

use std::fmt;
use std::str::FromStr;

use crate::ids::{EntityId, EntityTypeId};
use crate::scope::{ParseScopeError, Scope};

/// A reference to one instance of an [`crate::schema::EntityDef`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Ref {
    pub entity_type: EntityTypeId,
    pub entity_id: EntityId,
    pub scope: Scope,
}

impl Ref {
    pub fn new(entity_type: EntityTypeId, entity_id: EntityId, scope: Scope) -> Self {
        Self { entity_type, entity_id, scope }
    }

    /// The canonical key form of this reference (see [`RefKey`]).
    pub fn key(&self) -> RefKey {
        RefKey(self.to_string())
    }
}

impl fmt::Display for Ref {
    /// `installation:<type>:<id>`, `workspace:<installationId>:<type>:<id>`,
    /// or `global:<workspaceId>:<installationId>:<type>:<id>`, matching the
    /// scope tag emitted by [`Scope::Display`].
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.scope, self.entity_type, self.entity_id)
    }
}

impl FromStr for Ref {
    type Err = ParseRefError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // Scope prefixes are themselves colon-delimited, so split off the
        // rightmost two segments (type, id) and let Scope::from_str parse
        // the remaining prefix.
        let mut parts: Vec<&str> = s.split(':').collect();
        if parts.len() < 3 {
            return Err(ParseRefError(s.to_string()));
        }
        let entity_id = parts.pop().unwrap();
        let entity_type = parts.pop().unwrap();
        if entity_id.is_empty() || entity_type.is_empty() {
            return Err(ParseRefError(s.to_string()));
        }
        let scope_part = parts.join(":");
        let scope = Scope::from_str(&scope_part).map_err(|_| ParseRefError(s.to_string()))?;
        Ok(Ref {
            entity_type: EntityTypeId::from_string(entity_type),
            entity_id: EntityId::from_string(entity_id),
            scope,
        })
    }
}

impl serde::Serialize for Ref {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> serde::Deserialize<'de> for Ref {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// The canonical string form of a [`Ref`], suitable as a storage key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct RefKey(pub String);

impl fmt::Display for RefKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for RefKey {
    type Err = ParseRefError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // Validate by round-tripping through Ref so a malformed key is
        // rejected at parse time rather than at first lookup.
        Ref::from_str(s)?;
        Ok(RefKey(s.to_string()))
    }
}

impl From<&Ref> for RefKey {
    fn from(r: &Ref) -> Self {
        r.key()
    }
}

/// Invalid reference string (expected `<scope>:<entityType>:<entityId>`).
#[derive(Debug, Clone)]
pub struct ParseRefError(pub String);

impl fmt::Display for ParseRefError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid ref format: {:?}", self.0)
    }
}

impl std::error::Error for ParseRefError {}

impl From<ParseScopeError> for ParseRefError {
    fn from(e: ParseScopeError) -> Self {
        ParseRefError(e.0)
    }
}

#[cfg(test)]
#[path = "refs_tests.rs"]
mod tests;
