// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The `federation.*` error code namespace (`spec.md` §4.6-§4.8).

max_core::define_errors! {
    pub enum FederationError as "federation" {
        DuplicateInstallation { connector: String, name: String } => "duplicate_installation",
            "installation {name} for connector {connector} is already registered", [BadInput, HasConnector];
        UnknownDeployerKind { kind: String } => "unknown_deployer_kind",
            "no deployer registered for strategy {kind}", [BadInput];
        UnknownConnector { connector: String } => "unknown_connector",
            "no connector registered under {connector}", [NotFound, HasConnector];
        NodeNotFound { id: String } => "node_not_found",
            "no node {id} registered with this supervisor", [NotFound, HasEntityRef];
        SyncNotFound { sync_id: String } => "sync_not_found",
            "sync {sync_id} is not tracked by this installation", [NotFound];
    }
}
