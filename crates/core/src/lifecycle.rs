// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The uniform lifecycle contract every federation node exposes
//! (`spec.md` §4.6).
//!
//! [`Supervised`] is the shared interface an RPC proxy/handler pair
//! forwards on target `""`: every node — installation, workspace, or
//! global — answers `health`/`start`/`stop` the same way regardless of
//! whether it's local, a child process, or behind a socket.

use async_trait::async_trait;

use crate::error::MaxError;

/// Closed-variant outcome of [`Supervised::start`].
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StartResult {
    Started,
    AlreadyRunning,
    Refused { reason: String },
    Error { error: MaxError },
}

/// Closed-variant outcome of [`Supervised::stop`].
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StopResult {
    Stopped,
    AlreadyStopped,
    Refused { reason: String },
    Error { error: MaxError },
}

/// Closed-variant health report. `Degraded`/`Unhealthy` carry an optional
/// human-readable reason; aggregated reports additionally carry the count
/// of unhealthy/degraded children for observability (not in `spec.md`
/// verbatim, but a natural extension of the counts the teacher's
/// `MetricsHealthSummary` already surfaces).
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum HealthStatus {
    Healthy,
    Degraded {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        reason: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        unhealthy_children: Option<usize>,
    },
    Unhealthy {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        reason: Option<String>,
    },
}

impl HealthStatus {
    pub fn unhealthy(reason: impl Into<String>) -> Self {
        HealthStatus::Unhealthy { reason: Some(reason.into()) }
    }

    pub fn is_healthy(&self) -> bool {
        matches!(self, HealthStatus::Healthy)
    }
}

/// `health/start/stop` — the one contract every federation node exposes
/// uniformly whether it's local, a child process, or behind a socket.
///
/// `start` must be idempotent (a second call returns
/// [`StartResult::AlreadyRunning`]); `stop` runs every time it's called.
#[async_trait]
pub trait Supervised: Send + Sync {
    async fn health(&self) -> HealthStatus;
    async fn start(&self) -> StartResult;
    async fn stop(&self) -> StopResult;
}

#[cfg(test)]
#[path = "lifecycle_tests.rs"]
mod tests;
