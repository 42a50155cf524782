// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use proptest::prelude::*;
use yare::parameterized;

use super::*;
use crate::ids::{InstallationId, WorkspaceId};

#[test]
fn display_roundtrips_through_parse_installation() {
    let scope = Scope::Installation;
    let s = scope.to_string();
    assert_eq!(s, "installation");
    assert_eq!(s.parse::<Scope>().unwrap(), scope);
}

#[test]
fn display_roundtrips_through_parse_workspace() {
    let scope = Scope::Workspace { installation_id: InstallationId::from_string("ins-abc") };
    let s = scope.to_string();
    assert_eq!(s.parse::<Scope>().unwrap(), scope);
}

#[test]
fn display_roundtrips_through_parse_global() {
    let scope = Scope::Global {
        workspace_id: WorkspaceId::from_string("wsp-abc"),
        installation_id: InstallationId::from_string("ins-def"),
    };
    let s = scope.to_string();
    assert_eq!(s.parse::<Scope>().unwrap(), scope);
}

#[test]
fn upgrade_installation_to_workspace_succeeds() {
    let scope = Scope::Installation;
    let upgraded = scope.upgrade_to_workspace(InstallationId::from_string("ins-1")).unwrap();
    assert!(upgraded.is_workspace());
}

#[test]
fn upgrade_workspace_to_global_succeeds() {
    let scope = Scope::Workspace { installation_id: InstallationId::from_string("ins-1") };
    let upgraded = scope.upgrade_to_global(WorkspaceId::from_string("wsp-1")).unwrap();
    assert!(upgraded.is_global());
}

#[test]
fn upgrade_installation_directly_to_global_fails() {
    let scope = Scope::Installation;
    let err = scope.upgrade_to_global(WorkspaceId::from_string("wsp-1"));
    assert!(err.is_err());
}

#[parameterized(
    workspace_to_installation = { Scope::Workspace { installation_id: InstallationId::from_string("i") }, 0 },
    global_to_workspace = {
        Scope::Global {
            workspace_id: WorkspaceId::from_string("w"),
            installation_id: InstallationId::from_string("i"),
        },
        1
    },
)]
fn downgrade_is_rejected(scope: Scope, target_rank: u8) {
    let target = match target_rank {
        0 => Scope::Installation,
        _ => Scope::Workspace { installation_id: InstallationId::from_string("other") },
    };
    assert!(scope.upgrade(target).is_err());
}

#[test]
fn lateral_reupgrade_to_same_rank_is_rejected() {
    let scope = Scope::Workspace { installation_id: InstallationId::from_string("i") };
    let same_rank = Scope::Workspace { installation_id: InstallationId::from_string("other") };
    assert!(scope.upgrade(same_rank).is_err());
}

#[test]
fn parse_rejects_garbage() {
    assert!("nonsense".parse::<Scope>().is_err());
    assert!("workspace:".parse::<Scope>().is_err());
    assert!("global:only-one-part".parse::<Scope>().is_err());
}

#[test]
fn serde_roundtrip() {
    let scope = Scope::Workspace { installation_id: InstallationId::from_string("ins-1") };
    let json = serde_json::to_string(&scope).unwrap();
    let back: Scope = serde_json::from_str(&json).unwrap();
    assert_eq!(scope, back);
}

fn arb_scope() -> impl Strategy<Value = Scope> {
    prop_oneof![
        Just(Scope::Installation),
        "[a-z0-9]{1,10}".prop_map(|id| Scope::Workspace { installation_id: InstallationId::from_string(id) }),
        ("[a-z0-9]{1,10}", "[a-z0-9]{1,10}").prop_map(|(w, i)| Scope::Global {
            workspace_id: WorkspaceId::from_string(w),
            installation_id: InstallationId::from_string(i),
        }),
    ]
}

proptest! {
    /// `upgrade` moves strictly up the hierarchy or not at all: it succeeds
    /// exactly when `target` outranks `self`, and on success the result is
    /// `target` unchanged; on failure the rejected scope is `self` unchanged.
    #[test]
    fn upgrade_is_monotonic(from in arb_scope(), to in arb_scope()) {
        let from_rank = from.rank();
        let to_rank = to.rank();
        match from.clone().upgrade(to.clone()) {
            Ok(upgraded) => {
                prop_assert!(to_rank > from_rank);
                prop_assert_eq!(upgraded, to);
            }
            Err(downgrade) => {
                prop_assert!(to_rank <= from_rank);
                prop_assert_eq!(downgrade.from, from);
            }
        }
    }
}
