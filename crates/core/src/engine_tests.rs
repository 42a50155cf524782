// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn projection_all_includes_every_field() {
    assert!(Projection::All.includes("anything"));
}

#[test]
fn projection_refs_includes_nothing() {
    assert!(!Projection::Refs.includes("name"));
}

#[test]
fn projection_select_includes_only_listed_fields() {
    let p = Projection::select(["name", "owner"]);
    assert!(p.includes("name"));
    assert!(!p.includes("issues"));
}

#[test]
fn page_last_has_no_cursor_and_no_more() {
    let page = Page::last(vec![1, 2, 3]);
    assert!(!page.has_more);
    assert!(page.cursor.is_none());
}

#[test]
fn page_more_carries_cursor() {
    let page = Page::more(vec![1], "cursor-1");
    assert!(page.has_more);
    assert_eq!(page.cursor.as_deref(), Some("cursor-1"));
}

#[test]
fn where_clause_branch_round_trips() {
    let clause = WhereClause::Branch {
        kind: WhereBranchKind::And,
        clauses: vec![WhereClause::Leaf {
            field: "status".into(),
            op: WhereOp::Eq,
            value: serde_json::json!("open"),
        }],
    };
    let json = serde_json::to_string(&clause).unwrap();
    let back: WhereClause = serde_json::from_str(&json).unwrap();
    assert_eq!(clause, back);
}
