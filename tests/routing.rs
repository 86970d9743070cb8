// (c) Copyright 2025 Helsing GmbH. All rights reserved.
//! Nested routing: every mutation reaches the root exactly once, wrapped
//! and stamped per enclosing map level.
use crmap::{Document, DocumentError, InnerMap, Operation, map_data};
use std::cell::RefCell;

#[derive(Default)]
struct Recorder {
    ops: RefCell<Vec<Operation>>,
}

impl Recorder {
    fn ops(&self) -> Vec<Operation> {
        self.ops.borrow().clone()
    }
}

impl Document for Recorder {
    fn operate(&self, op: Operation) -> Result<(), DocumentError> {
        self.ops.borrow_mut().push(op);
        Ok(())
    }

    fn has_context(&self) -> bool {
        true
    }
}

#[test]
fn two_level_nesting_restamps_each_level() {
    let doc = Recorder::default();
    let mut root = InnerMap::root_from(
        &doc,
        map_data! {
            maps: {
                "outer" => {
                    maps: {
                        "inner" => {
                            counters: { "c" => 0 },
                        }
                    },
                }
            },
        },
    );

    root.maps_mut()
        .get_mut("outer")
        .unwrap()
        .as_map_mut()
        .unwrap()
        .maps_mut()
        .get_mut("inner")
        .unwrap()
        .as_map_mut()
        .unwrap()
        .counters_mut()
        .increment("c", 1)
        .unwrap();

    // one operation at the root: outer wraps inner wraps the increment,
    // and the innermost operation keeps the innermost key
    let expected = Operation::in_map(
        "outer",
        Operation::in_map("inner", Operation::increment(1).named("c")),
    );
    assert_eq!(doc.ops(), vec![expected]);
}

#[test]
fn transient_nested_maps_route_correctly() {
    let doc = Recorder::default();
    let root = InnerMap::root(&doc);

    // nothing exists locally, yet the transient chain still addresses the
    // mutation through both levels
    let mut outer = root.maps().get("outer").unwrap().into_value();
    let outer_map = outer.as_map_mut().unwrap();
    let mut inner = outer_map.maps().get("inner").unwrap().into_value();
    inner
        .as_map_mut()
        .unwrap()
        .counters_mut()
        .increment("c", 1)
        .unwrap();

    let expected = Operation::in_map(
        "outer",
        Operation::in_map("inner", Operation::increment(1).named("c")),
    );
    assert_eq!(doc.ops(), vec![expected]);
    // and nothing was created locally along the way
    assert!(!root.maps().contains("outer"));
}

#[test]
fn sibling_kinds_route_independently() {
    let doc = Recorder::default();
    let mut root = InnerMap::root_from(
        &doc,
        map_data! {
            maps: {
                "profile" => {},
            },
        },
    );

    let profile = root
        .maps_mut()
        .get_mut("profile")
        .unwrap()
        .as_map_mut()
        .unwrap();
    profile.counters_mut().increment("logins", 1).unwrap();
    profile.flags_mut().set("verified", true).unwrap();

    assert_eq!(
        doc.ops(),
        vec![
            Operation::in_map("profile", Operation::increment(1).named("logins")),
            Operation::in_map("profile", Operation::flag(true).named("verified")),
        ],
    );
}

#[test]
fn map_level_operate_dispatches_by_kind() {
    let doc = Recorder::default();
    let root = InnerMap::root(&doc);

    root.operate("visits", Operation::increment(2)).unwrap();
    root.operate("tags", Operation::add("el")).unwrap();

    assert_eq!(
        doc.ops(),
        vec![
            Operation::increment(2).named("visits"),
            Operation::add("el").named("tags"),
        ],
    );
}

#[test]
fn nested_map_deletion_routes_through_the_parent() {
    let doc = Recorder::default();
    let mut root = InnerMap::root_from(
        &doc,
        map_data! {
            maps: {
                "outer" => {
                    sets: { "tags" => ["a"] },
                }
            },
        },
    );

    root.maps_mut()
        .get_mut("outer")
        .unwrap()
        .as_map_mut()
        .unwrap()
        .sets_mut()
        .delete("tags")
        .unwrap();

    let expected = Operation::in_map("outer", Operation::delete(crmap::ValueKind::Set).named("tags"));
    assert_eq!(doc.ops(), vec![expected]);
}
