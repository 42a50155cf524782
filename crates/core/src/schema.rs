// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Entity graph description (`spec.md` §3).
//!
//! A [`Schema`] is a closed world of [`EntityDef`]s connected by `ref` and
//! `collection` fields. Cyclic entity graphs (a field pointing back to its
//! own holder) are legal: fields carry the target's [`EntityTypeId`], not
//! the `EntityDef` itself, so the graph lives in the schema's index rather
//! than in Rust's type system.

use indexmap::IndexMap;

use crate::ids::EntityTypeId;

/// A scalar field's primitive kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScalarKind {
    String,
    Number,
    Boolean,
    Date,
}

/// One field on an [`EntityDef`].
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Field {
    Scalar { scalar: ScalarKind },
    /// A single reference to another entity instance.
    Ref { target: EntityTypeId },
    /// A one-to-many reference, loaded via a collection loader.
    Collection { target: EntityTypeId },
}

impl Field {
    pub fn scalar(kind: ScalarKind) -> Self {
        Field::Scalar { scalar: kind }
    }

    pub fn reference(target: impl Into<EntityTypeId>) -> Self {
        Field::Ref { target: target.into() }
    }

    pub fn collection(target: impl Into<EntityTypeId>) -> Self {
        Field::Collection { target: target.into() }
    }

    pub fn is_scalar(&self) -> bool {
        matches!(self, Field::Scalar { .. })
    }

    pub fn target(&self) -> Option<&EntityTypeId> {
        match self {
            Field::Scalar { .. } => None,
            Field::Ref { target } | Field::Collection { target } => Some(target),
        }
    }
}

/// `(name, fields)` — one entity type in a [`Schema`].
///
/// Field order is preserved (an [`IndexMap`]) since loaders and seeders
/// enumerate fields deterministically.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct EntityDef {
    pub name: EntityTypeId,
    pub fields: IndexMap<String, Field>,
}

impl EntityDef {
    pub fn new(name: impl Into<EntityTypeId>) -> Self {
        Self { name: name.into(), fields: IndexMap::new() }
    }

    pub fn with_field(mut self, name: impl Into<String>, field: Field) -> Self {
        self.fields.insert(name.into(), field);
        self
    }

    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.get(name)
    }

    /// Every field whose target is another entity (`ref` or `collection`).
    pub fn relationship_fields(&self) -> impl Iterator<Item = (&str, &Field)> {
        self.fields.iter().filter(|(_, f)| !f.is_scalar()).map(|(name, f)| (name.as_str(), f))
    }
}

/// `(namespace, entities, roots)` — the closed world a connector's schema
/// describes.
///
/// Invariant: every id in `roots` must be a key in `entities`
/// ([`Schema::validate`]).
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Schema {
    pub namespace: String,
    pub entities: IndexMap<EntityTypeId, EntityDef>,
    pub roots: Vec<EntityTypeId>,
}

impl Schema {
    pub fn new(namespace: impl Into<String>) -> Self {
        Self { namespace: namespace.into(), entities: IndexMap::new(), roots: Vec::new() }
    }

    pub fn with_entity(mut self, def: EntityDef) -> Self {
        self.entities.insert(def.name.clone(), def);
        self
    }

    pub fn with_root(mut self, entity_type: impl Into<EntityTypeId>) -> Self {
        self.roots.push(entity_type.into());
        self
    }

    pub fn entity(&self, entity_type: &EntityTypeId) -> Option<&EntityDef> {
        self.entities.get(entity_type)
    }

    /// Checks the closed-world invariant: every root names an entity that
    /// actually exists in this schema.
    pub fn validate(&self) -> Result<(), SchemaInvariantViolation> {
        for root in &self.roots {
            if !self.entities.contains_key(root) {
                return Err(SchemaInvariantViolation::RootNotInEntities { entity_type: root.clone() });
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum SchemaInvariantViolation {
    #[error("root entity type {entity_type} is not declared in entities")]
    RootNotInEntities { entity_type: EntityTypeId },
}

#[cfg(test)]
#[path = "schema_tests.rs"]
mod tests;
