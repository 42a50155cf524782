// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The `rpc.*` error code namespace (`spec.md` §4.5).

max_core::define_errors! {
    pub enum RpcError as "rpc" {
        UnknownTarget { target: String } => "unknown_target",
            "unknown RPC target {target}", [BadInput];
        UnknownMethod { target: String, method: String } => "unknown_method",
            "target {target} has no method {method}", [BadInput];
        NodeNotFound { installation_id: String } => "node_not_found",
            "no installation {installation_id} registered at this node", [NotFound, HasEntityRef];
    }
}
