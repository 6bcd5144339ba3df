use std::sync::Arc;

use pretty_assertions::assert_eq;

use super::filter;
use crate::fault::{Fault, FaultRef};
use crate::test_support::{
    drop_all, frame_names, keep, leaf, leaf_with_frames, push_frames, Probe, Timeout,
};

#[test]
fn identity_handler_returns_the_same_leaf() {
    let fault = leaf("solo");
    let filtered = filter(keep, &fault).unwrap();

    assert!(Arc::ptr_eq(&filtered, &fault));
}

#[test]
fn identity_handler_returns_the_same_group() {
    let tree = Fault::group(vec![
        leaf("a"),
        Fault::group(vec![leaf("b"), leaf("c")]),
    ]);
    let filtered = filter(keep, &tree).unwrap();

    assert!(Arc::ptr_eq(&filtered, &tree));
}

#[test]
fn drop_all_eliminates_a_leaf() {
    assert!(filter(drop_all, &leaf("gone")).is_none());
}

#[test]
fn drop_all_eliminates_a_whole_tree() {
    let tree = Fault::group(vec![
        Fault::group(vec![leaf("a"), leaf("b")]),
        leaf("c"),
    ]);
    assert!(filter(drop_all, &tree).is_none());
}

#[test]
fn dropping_one_of_two_returns_the_survivor_directly() {
    let a = leaf("a");
    let b = leaf("b");
    let tree = Fault::group(vec![Arc::clone(&a), Arc::clone(&b)]);

    let filtered = filter(
        |node| {
            if Arc::ptr_eq(node, &b) {
                None
            } else {
                Some(Arc::clone(node))
            }
        },
        &tree,
    )
    .unwrap();

    assert!(Arc::ptr_eq(&filtered, &a));
    assert!(!filtered.is_group());
}

#[test]
fn nested_groups_collapse_through_both_levels() {
    let keeper = Fault::new(Timeout(10)).shared();
    let tree = Fault::group(vec![
        leaf("v1"),
        Fault::group(vec![Arc::clone(&keeper), leaf("v2")]),
    ]);

    let filtered = filter(
        |node| {
            if node.is::<Probe>() {
                None
            } else {
                Some(Arc::clone(node))
            }
        },
        &tree,
    )
    .unwrap();

    assert!(Arc::ptr_eq(&filtered, &keeper));
}

#[test]
fn unchanged_subtree_is_reused_not_rebuilt() {
    let untouched = Fault::group(vec![leaf("a"), leaf("b")]);
    let doomed = leaf("doomed");
    let tree = Fault::group(vec![Arc::clone(&untouched), Arc::clone(&doomed)]);

    let filtered = filter(
        |node| {
            if Arc::ptr_eq(node, &doomed) {
                None
            } else {
                Some(Arc::clone(node))
            }
        },
        &tree,
    )
    .unwrap();

    assert!(Arc::ptr_eq(&filtered, &untouched));
}

#[test]
fn changed_group_keeps_child_order() {
    let a = leaf("a");
    let b = leaf("b");
    let c = leaf("c");
    let d = leaf("d");
    let tree = Fault::group(vec![
        Arc::clone(&a),
        Arc::clone(&b),
        Arc::clone(&c),
        Arc::clone(&d),
    ]);

    let filtered = filter(
        |node| {
            if Arc::ptr_eq(node, &c) {
                None
            } else {
                Some(Arc::clone(node))
            }
        },
        &tree,
    )
    .unwrap();

    assert!(!Arc::ptr_eq(&filtered, &tree));
    let children = filtered.children();
    assert_eq!(children.len(), 3);
    assert!(Arc::ptr_eq(&children[0], &a));
    assert!(Arc::ptr_eq(&children[1], &b));
    assert!(Arc::ptr_eq(&children[2], &d));
}

#[test]
fn content_equal_replacement_still_counts_as_a_change() {
    let tree = Fault::group(vec![leaf("same"), leaf("same")]);

    // Every leaf is replaced by a content-equal but newly allocated fault.
    let filtered = filter(|_node| Some(leaf("same")), &tree).unwrap();

    assert!(!Arc::ptr_eq(&filtered, &tree));
    assert!(filtered.is_group());
    for (old, new) in tree.children().iter().zip(filtered.children()) {
        assert!(!Arc::ptr_eq(old, new));
    }
}

#[test]
fn handler_sees_every_leaf_in_order_and_no_groups() {
    let tree = Fault::group(vec![
        leaf("first"),
        Fault::group(vec![leaf("second"), leaf("third")]),
        leaf("fourth"),
    ]);

    let mut visited = Vec::new();
    let filtered = filter(
        |node| {
            assert!(!node.is_group());
            visited.push(node.downcast_ref::<Probe>().unwrap().0);
            Some(Arc::clone(node))
        },
        &tree,
    )
    .unwrap();

    assert!(Arc::ptr_eq(&filtered, &tree));
    assert_eq!(visited, ["first", "second", "third", "fourth"]);
}

#[test]
fn push_down_gives_each_original_leaf_its_full_trace() {
    let a = leaf_with_frames("a", &["a1"]);
    let b = leaf_with_frames("b", &["b1", "b2"]);
    let inner = Fault::group(vec![Arc::clone(&a), Arc::clone(&b)]);
    push_frames(&inner, &["join_inner"]);
    let c = leaf_with_frames("c", &["c1"]);
    let root = Fault::group(vec![Arc::clone(&inner), Arc::clone(&c)]);
    push_frames(&root, &["join_root", "supervisor"]);

    // Replacing `b` changes both groups, so nothing is preserved and every
    // segment is fully distributed.
    let replacement = Fault::new(Probe("b-replacement"))
        .with_cause(Arc::clone(&b))
        .shared();
    let filtered = filter(
        |node| {
            if Arc::ptr_eq(node, &b) {
                Some(Arc::clone(&replacement))
            } else {
                Some(Arc::clone(node))
            }
        },
        &root,
    )
    .unwrap();

    assert_eq!(
        frame_names(&a.segment()),
        ["join_root", "supervisor", "join_inner", "a1"]
    );
    // The replaced leaf keeps a full trace too: it lives on as the
    // replacement's cause.
    assert_eq!(
        frame_names(&b.segment()),
        ["join_root", "supervisor", "join_inner", "b1", "b2"]
    );
    assert_eq!(frame_names(&c.segment()), ["join_root", "supervisor", "c1"]);

    // Distributed group segments are cleared; rebuilt groups start empty.
    assert!(root.segment().is_empty());
    assert!(inner.segment().is_empty());
    assert!(filtered.segment().is_empty());

    // The replacement itself was never part of the original tree, so
    // push-down leaves it alone.
    assert!(replacement.segment().is_empty());
    assert!(Arc::ptr_eq(replacement.cause().unwrap(), &b));

    // New tree shape: [[a, replacement], c], order preserved.
    assert!(filtered.is_group());
    let new_inner = &filtered.children()[0];
    assert!(new_inner.is_group());
    assert!(Arc::ptr_eq(&new_inner.children()[0], &a));
    assert!(Arc::ptr_eq(&new_inner.children()[1], &replacement));
    assert!(Arc::ptr_eq(&filtered.children()[1], &c));
}

#[test]
fn preserved_subtree_keeps_its_compact_segments() {
    let k = leaf_with_frames("k", &["k1"]);
    let v = leaf_with_frames("v", &["v1"]);
    let kept_group = Fault::group(vec![Arc::clone(&k), Arc::clone(&v)]);
    push_frames(&kept_group, &["kept_join"]);
    let doomed = leaf_with_frames("doomed", &["d1"]);
    let root = Fault::group(vec![Arc::clone(&kept_group), Arc::clone(&doomed)]);
    push_frames(&root, &["root_join"]);

    let filtered = filter(
        |node| {
            if Arc::ptr_eq(node, &doomed) {
                None
            } else {
                Some(Arc::clone(node))
            }
        },
        &root,
    )
    .unwrap();

    // The surviving subtree is the preserved group itself, untouched:
    // frames stay factored out on the group rather than copied to leaves.
    assert!(Arc::ptr_eq(&filtered, &kept_group));
    assert_eq!(frame_names(&kept_group.segment()), ["kept_join"]);
    assert_eq!(frame_names(&k.segment()), ["k1"]);
    assert_eq!(frame_names(&v.segment()), ["v1"]);

    // The dropped leaf still got the root's frames.
    assert_eq!(frame_names(&doomed.segment()), ["root_join", "d1"]);
    assert!(root.segment().is_empty());
}

#[test]
fn trace_distribution_happens_even_when_everything_is_dropped() {
    let a = leaf_with_frames("a", &["a1"]);
    let b = leaf_with_frames("b", &["b1"]);
    let root = Fault::group(vec![Arc::clone(&a), Arc::clone(&b)]);
    push_frames(&root, &["join"]);

    assert!(filter(drop_all, &root).is_none());

    assert_eq!(frame_names(&a.segment()), ["join", "a1"]);
    assert_eq!(frame_names(&b.segment()), ["join", "b1"]);
}

#[test]
fn deep_trees_filter_without_overflowing() {
    let mut tree: FaultRef = leaf("bottom");
    for _ in 0..5_000 {
        tree = Fault::group(vec![leaf("rib"), tree]);
    }

    let filtered = filter(keep, &tree).unwrap();
    assert!(Arc::ptr_eq(&filtered, &tree));

    // Dropping the ribs collapses the whole spine down to the bottom leaf.
    let collapsed = filter(
        |node| {
            if node.downcast_ref::<Probe>().unwrap().0 == "rib" {
                None
            } else {
                Some(Arc::clone(node))
            }
        },
        &tree,
    )
    .unwrap();
    assert_eq!(collapsed.downcast_ref::<Probe>().unwrap().0, "bottom");
}
