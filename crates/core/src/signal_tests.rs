// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

fn node(s: &str) -> NodeId {
    NodeId::from_string(s).unwrap()
}

#[test]
fn internal_kinds_never_classify_as_own_or_foreign() {
    let sig = Signal::internal(SignalKind::UnclaimInternal, "t", node("a_1_0"), 0);
    assert_eq!(classify(&sig, &node("a_1_0")), Origin::Internal);
    assert_eq!(classify(&sig, &node("b_1_0")), Origin::Internal);
}

#[test]
fn own_vs_foreign_classification() {
    let mine = node("a_1_0");
    let theirs = node("b_1_0");
    let own = Signal::bus(SignalKind::Claiming, Some("t".into()), mine.clone(), None, 0);
    let foreign = Signal::bus(SignalKind::Claiming, Some("t".into()), theirs, None, 0);
    assert_eq!(classify(&own, &mine), Origin::Own);
    assert_eq!(classify(&foreign, &mine), Origin::Foreign);
}

#[test]
fn reference_equality_is_real_not_identity() {
    assert!(reference_matches(None, None));
    assert!(reference_matches(Some(7), Some(7)));
    assert!(!reference_matches(Some(7), Some(8)));
    assert!(!reference_matches(Some(7), None));
    assert!(!reference_matches(None, Some(7)));
}

#[test]
fn display_matches_wire_vocabulary() {
    assert_eq!(SignalKind::Claiming.to_string(), "CLAIMING");
    assert_eq!(SignalKind::DoHeartbeat.to_string(), "DOHEARTBEAT");
    assert_eq!(SignalKind::UnclaimInternal.to_string(), "UNCLAIM_I");
}
