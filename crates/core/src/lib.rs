// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! max-core: identity, error envelope, and domain model shared by every
//! other Max crate.

pub mod macros;

pub mod clock;
pub mod engine;
pub mod error;
pub mod id;
pub mod ids;
pub mod lifecycle;
pub mod plan;
pub mod refs;
pub mod schema;
pub mod scope;
pub mod task;

pub use clock::{Clock, FakeClock, SystemClock};
pub use engine::{
    Engine, EntityInput, EntityResult, Page, PageRequest, Projection, Query, SyncMeta, WhereBranchKind,
    WhereClause, WhereOp,
};
pub use error::{Facet, MaxError};
pub use id::{short, IdGen, SequentialIdGen, UuidIdGen};
pub use ids::{DurationMs, EntityId, EntityTypeId, InstallationId, LoaderName, SyncId, TaskId, WorkspaceId};
pub use lifecycle::{HealthStatus, StartResult, StopResult, Supervised};
pub use plan::{LoaderBatch, Operation, Step, SyncPlan, Target};
pub use refs::{ParseRefError, Ref, RefKey};
pub use schema::{EntityDef, Field, ScalarKind, Schema, SchemaInvariantViolation};
pub use scope::{ParseScopeError, Scope, ScopeDowngrade};
pub use task::{
    LoadCollectionPayload, LoadFieldsPayload, SyncGroupPayload, SyncStepPayload, Task, TaskPayload,
    TaskState, TaskTemplate,
};
