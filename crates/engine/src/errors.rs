// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Error codes this crate raises. `core.*` codes are spelled out literally
//! by `spec.md` §4.12 (the engine façade's own invariants). Execution-level
//! failures (an unresolved loader, a task that fails outright) are
//! constructed by annotating the originating error in place
//! (`max_core::MaxError::annotate`) rather than through an enum here, per
//! the never-rewrap policy `max-storage::task_store` already follows.

max_core::define_errors! {
    pub enum EngineError as "core" {
        EntityNotFound { entity_ref: String } => "entity_not_found",
            "entity {entity_ref} not found", [NotFound, HasEntityRef];
        FieldNotLoaded { entity_ref: String, field: String } => "field_not_loaded",
            "field {field} not loaded for {entity_ref}", [NotFound, HasEntityField, HasEntityRef];
        InvalidCursor { cursor: String } => "invalid_cursor",
            "cursor {cursor} is not a valid page token", [BadInput];
    }
}
