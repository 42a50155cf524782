// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Hierarchical scope tagging for data crossing a federation boundary.
//!
//! A [`Scope`] records where a piece of data originated in the
//! Global → Workspace → Installation hierarchy. Scope only ever *upgrades*
//! as data crosses a boundary upward (installation → workspace → global);
//! downgrading is rejected (`spec.md` testable property 2).

use std::fmt;

use crate::ids::{InstallationId, WorkspaceId};

/// Where a [`crate::refs::Ref`] originated.
///
/// Serializes via `Display`/`FromStr` to a tagged string:
/// `"installation"`, `"workspace:<installationId>"`,
/// `"global:<workspaceId>:<installationId>"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Scope {
    Installation,
    Workspace { installation_id: InstallationId },
    Global { workspace_id: WorkspaceId, installation_id: InstallationId },
}

impl Scope {
    /// Ordinal used to enforce upgrade-only monotonicity.
    fn rank(&self) -> u8 {
        match self {
            Scope::Installation => 0,
            Scope::Workspace { .. } => 1,
            Scope::Global { .. } => 2,
        }
    }

    pub fn is_installation(&self) -> bool {
        matches!(self, Scope::Installation)
    }

    pub fn is_workspace(&self) -> bool {
        matches!(self, Scope::Workspace { .. })
    }

    pub fn is_global(&self) -> bool {
        matches!(self, Scope::Global { .. })
    }

    /// Upgrade an installation-scoped value to workspace scope.
    ///
    /// Returns `self` unchanged (as an error) if `self` is already
    /// workspace- or global-scoped, since scope never narrows or re-tags
    /// sideways — only installation → workspace → global is legal.
    pub fn upgrade_to_workspace(
        self,
        installation_id: InstallationId,
    ) -> Result<Scope, ScopeDowngrade> {
        match self {
            Scope::Installation => Ok(Scope::Workspace { installation_id }),
            other => Err(ScopeDowngrade { from: other, attempted_rank: 1 }),
        }
    }

    /// Upgrade an installation- or workspace-scoped value to global scope.
    pub fn upgrade_to_global(
        self,
        workspace_id: WorkspaceId,
    ) -> Result<Scope, ScopeDowngrade> {
        match self {
            Scope::Installation => {
                Err(ScopeDowngrade { from: Scope::Installation, attempted_rank: 2 })
            }
            Scope::Workspace { installation_id } => {
                Ok(Scope::Global { workspace_id, installation_id })
            }
            other @ Scope::Global { .. } => Err(ScopeDowngrade { from: other, attempted_rank: 2 }),
        }
    }

    /// Generic upgrade entry point: fails unless `target.rank() > self.rank()`.
    pub fn upgrade(self, target: Scope) -> Result<Scope, ScopeDowngrade> {
        if target.rank() > self.rank() {
            Ok(target)
        } else {
            let attempted_rank = target.rank();
            Err(ScopeDowngrade { from: self, attempted_rank })
        }
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scope::Installation => write!(f, "installation"),
            Scope::Workspace { installation_id } => write!(f, "workspace:{}", installation_id),
            Scope::Global { workspace_id, installation_id } => {
                write!(f, "global:{}:{}", workspace_id, installation_id)
            }
        }
    }
}

impl std::str::FromStr for Scope {
    type Err = ParseScopeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == "installation" {
            return Ok(Scope::Installation);
        }
        if let Some(rest) = s.strip_prefix("workspace:") {
            if rest.is_empty() {
                return Err(ParseScopeError(s.to_string()));
            }
            return Ok(Scope::Workspace { installation_id: InstallationId::from_string(rest) });
        }
        if let Some(rest) = s.strip_prefix("global:") {
            let mut parts = rest.splitn(2, ':');
            let workspace_id = parts.next().filter(|p| !p.is_empty());
            let installation_id = parts.next().filter(|p| !p.is_empty());
            return match (workspace_id, installation_id) {
                (Some(w), Some(i)) => Ok(Scope::Global {
                    workspace_id: WorkspaceId::from_string(w),
                    installation_id: InstallationId::from_string(i),
                }),
                _ => Err(ParseScopeError(s.to_string())),
            };
        }
        Err(ParseScopeError(s.to_string()))
    }
}

impl serde::Serialize for Scope {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> serde::Deserialize<'de> for Scope {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// A scope upgrade was attempted that would narrow or laterally re-tag a
/// [`Scope`] instead of moving strictly up the hierarchy.
#[derive(Debug, Clone)]
pub struct ScopeDowngrade {
    pub from: Scope,
    attempted_rank: u8,
}

impl fmt::Display for ScopeDowngrade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "cannot upgrade scope {} (rank {}) to rank {}",
            self.from,
            self.from.rank(),
            self.attempted_rank
        )
    }
}

impl std::error::Error for ScopeDowngrade {}

/// Invalid scope string (expected `installation`, `workspace:<id>`, or
/// `global:<wsId>:<installationId>`).
#[derive(Debug, Clone)]
pub struct ParseScopeError(pub String);

impl fmt::Display for ParseScopeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid scope format: {:?}", self.0)
    }
}

impl std::error::Error for ParseScopeError {}

#[cfg(test)]
#[path = "scope_tests.rs"]
mod tests;
