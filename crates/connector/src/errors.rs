// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The `connector.*` error code namespace (`spec.md` §4.9, §4.11).

max_core::define_errors! {
    pub enum ConnectorError as "connector" {
        UnknownLoader { connector: String, loader: String } => "unknown_loader",
            "connector {connector} has no loader named {loader}", [NotFound, HasConnector, HasLoaderName];
        UnknownCollectionField { connector: String, field: String } => "unknown_collection_field",
            "connector {connector} has no resolver for collection field {field}", [NotFound, HasConnector];
        LoaderFailed { loader: String, reason: String } => "loader_failed",
            "loader {loader} failed: {reason}", [HasLoaderName];
        ConnectFailed { connector: String, reason: String } => "connect_failed",
            "connector {connector} failed to connect: {reason}", [HasConnector];
    }
}
