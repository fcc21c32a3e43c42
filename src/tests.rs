extern crate std;

use std::{ops::Range, prelude::v1::*, ptr::NonNull};

use cordyceps::Linked;
use proptest::prelude::*;

use crate::model::{self, TestNode};

use super::*;

fn insert_find_all(keys: &[u32]) {
    fn run<const ORDER: u8>(keys: &[u32]) {
        let mut tree: RgbTree<TestNode, ORDER> = RgbTree::new();

        for &key in keys {
            tree.insert(TestNode::new(key));
            tree.assert_invariants();
        }

        for key in keys {
            let node = tree.get_raw(key).expect("item not found");
            assert_eq!(unsafe { node.as_ref().key }, *key);
        }
    }

    run::<1>(keys);
    run::<2>(keys);
    run::<3>(keys);
}

#[test]
fn zero_elems_find() {
    insert_find_all(&[]);
}

#[test]
fn single_elem_find() {
    insert_find_all(&[0]);
}

#[test]
fn two_elems_find() {
    insert_find_all(&[0, 1]);
    insert_find_all(&[1, 0]);
}

#[test]
fn three_elems_find() {
    insert_find_all(&[0, 1, 2]);
    insert_find_all(&[0, 2, 1]);
    insert_find_all(&[1, 0, 2]);
    insert_find_all(&[1, 2, 0]);
    insert_find_all(&[2, 0, 1]);
    insert_find_all(&[2, 1, 0]);
}

#[test]
fn four_elems_find() {
    insert_find_all(&[0, 1, 2, 3]);
    insert_find_all(&[0, 1, 3, 2]);
    insert_find_all(&[0, 2, 1, 3]);
    insert_find_all(&[0, 2, 3, 1]);
    insert_find_all(&[0, 3, 1, 2]);
    insert_find_all(&[0, 3, 2, 1]);

    insert_find_all(&[1, 0, 2, 3]);
    insert_find_all(&[1, 0, 3, 2]);
    insert_find_all(&[1, 2, 0, 3]);
    insert_find_all(&[1, 2, 3, 0]);
    insert_find_all(&[1, 3, 0, 2]);
    insert_find_all(&[1, 3, 2, 0]);

    insert_find_all(&[2, 0, 1, 3]);
    insert_find_all(&[2, 0, 3, 1]);
    insert_find_all(&[2, 1, 0, 3]);
    insert_find_all(&[2, 1, 3, 0]);
    insert_find_all(&[2, 3, 0, 1]);
    insert_find_all(&[2, 3, 1, 0]);

    insert_find_all(&[3, 0, 1, 2]);
    insert_find_all(&[3, 0, 2, 1]);
    insert_find_all(&[3, 1, 0, 2]);
    insert_find_all(&[3, 1, 2, 0]);
    insert_find_all(&[3, 2, 0, 1]);
    insert_find_all(&[3, 2, 1, 0]);
}

fn insert_remove_all(keys: &[u32]) {
    fn run<const ORDER: u8>(keys: &[u32]) {
        let mut tree: RgbTree<TestNode, ORDER> = RgbTree::new();

        for &key in keys {
            tree.insert(TestNode::new(key));
            tree.assert_invariants();
        }

        for key in keys {
            let node = tree.get_raw(key).expect("item not found");
            unsafe { tree.remove_at(node) };
            tree.assert_invariants();
        }

        assert!(tree.is_empty());

        for &key in keys {
            tree.insert(TestNode::new(key));
            tree.assert_invariants();
        }

        for key in keys.iter().rev() {
            let node = tree.get_raw(key).expect("item not found");
            unsafe { tree.remove_at(node) };
            tree.assert_invariants();
        }
    }

    run::<1>(keys);
    run::<2>(keys);
    run::<3>(keys);
}

#[test]
fn remove_one() {
    insert_remove_all(&[0]);
}

#[test]
fn remove_two() {
    insert_remove_all(&[0, 1]);
    insert_remove_all(&[1, 0]);
}

#[test]
fn remove_three() {
    insert_remove_all(&[0, 1, 2]);
    insert_remove_all(&[0, 2, 1]);
    insert_remove_all(&[1, 0, 2]);
    insert_remove_all(&[1, 2, 0]);
    insert_remove_all(&[2, 0, 1]);
    insert_remove_all(&[2, 1, 0]);
}

#[test]
fn remove_four() {
    insert_remove_all(&[0, 1, 2, 3]);
    insert_remove_all(&[0, 1, 3, 2]);
    insert_remove_all(&[0, 2, 1, 3]);
    insert_remove_all(&[0, 2, 3, 1]);
    insert_remove_all(&[0, 3, 1, 2]);
    insert_remove_all(&[0, 3, 2, 1]);

    insert_remove_all(&[1, 0, 2, 3]);
    insert_remove_all(&[1, 0, 3, 2]);
    insert_remove_all(&[1, 2, 0, 3]);
    insert_remove_all(&[1, 2, 3, 0]);
    insert_remove_all(&[1, 3, 0, 2]);
    insert_remove_all(&[1, 3, 2, 0]);

    insert_remove_all(&[2, 0, 1, 3]);
    insert_remove_all(&[2, 0, 3, 1]);
    insert_remove_all(&[2, 1, 0, 3]);
    insert_remove_all(&[2, 1, 3, 0]);
    insert_remove_all(&[2, 3, 0, 1]);
    insert_remove_all(&[2, 3, 1, 0]);

    insert_remove_all(&[3, 0, 1, 2]);
    insert_remove_all(&[3, 0, 2, 1]);
    insert_remove_all(&[3, 1, 0, 2]);
    insert_remove_all(&[3, 1, 2, 0]);
    insert_remove_all(&[3, 2, 0, 1]);
    insert_remove_all(&[3, 2, 1, 0]);
}

fn collect_keys<const ORDER: u8>(tree: &RgbTree<TestNode, ORDER>) -> Vec<u32> {
    tree.iter().map(|node| node.key).collect()
}

fn height(link: Link<TestNode>) -> usize {
    match link {
        None => 0,
        Some(node) => unsafe {
            let links = TestNode::links(node);
            let left = height(links.as_ref().child(Dir::Left));
            let right = height(links.as_ref().child(Dir::Right));

            1 + left.max(right)
        },
    }
}

fn depth(node: &TestNode) -> usize {
    let mut depth = 0;
    let mut cur = unsafe { TestNode::links(NonNull::from(node)).as_ref().parent() };

    while let Some(up) = cur {
        depth += 1;
        cur = unsafe { TestNode::links(up).as_ref().parent() };
    }

    depth
}

fn zero_counts(link: Link<TestNode>, acc: usize, out: &mut Vec<usize>) {
    match link {
        None => out.push(acc),
        Some(node) => unsafe {
            let links = TestNode::links(node);
            let acc = acc + usize::from(links.as_ref().color() == 0);

            zero_counts(links.as_ref().child(Dir::Left), acc, out);
            zero_counts(links.as_ref().child(Dir::Right), acc, out);
        },
    }
}

// Key, color, and depth of every entry in order. Two trees with equal
// fingerprints are structurally identical.
fn fingerprint<const ORDER: u8>(tree: &RgbTree<TestNode, ORDER>) -> Vec<(u32, u8, usize)> {
    let mut out = Vec::with_capacity(tree.len());
    let mut cur = tree.first();

    while let Some(node) = cur {
        let color = unsafe { TestNode::links(NonNull::from(node)).as_ref().color() };
        out.push((node.key, color, depth(node)));

        cur = tree.next(node);
    }

    out
}

#[test]
fn empty_tree_queries() {
    let tree: RgbTree<TestNode, 1> = RgbTree::new();

    assert!(tree.is_empty());
    assert_eq!(tree.len(), 0);
    assert!(tree.get(&0).is_none());
    assert!(tree.first().is_none());
    assert!(tree.last().is_none());
    assert_eq!(tree.iter().count(), 0);
    tree.assert_invariants();
}

#[test]
fn single_node_root_is_color_0() {
    let mut tree: RgbTree<TestNode, 3> = RgbTree::new();
    tree.insert(TestNode::new(7));

    let root = tree.root.expect("tree has a root");
    assert_eq!(unsafe { TestNode::links(root).as_ref().color() }, 0);
    tree.assert_invariants();

    assert_eq!(tree.remove(&7).map(|node| node.key), Some(7));
    assert!(tree.is_empty());
    assert!(tree.root.is_none());
}

#[test]
fn remove_missing_key_is_none() {
    let mut tree: RgbTree<TestNode, 1> = RgbTree::new();
    tree.insert(TestNode::new(1));

    assert!(tree.remove(&2).is_none());
    assert_eq!(tree.len(), 1);
    tree.assert_invariants();
}

// Five ascending inserts at order 1 behave like a red-black tree: shallow,
// balanced, and enumerable in order.
#[test]
fn ascending_inserts_stay_shallow() {
    let mut tree: RgbTree<TestNode, 1> = RgbTree::new();

    for key in [1, 3, 5, 7, 9] {
        tree.insert(TestNode::new(key));
        tree.assert_invariants();
    }

    assert_eq!(collect_keys(&tree), vec![1, 3, 5, 7, 9]);
    assert!(height(tree.root) <= 3);
}

#[test]
fn interior_removals() {
    let mut tree: RgbTree<TestNode, 1> = RgbTree::new();

    for key in 1..=7 {
        tree.insert(TestNode::new(key));
        tree.assert_invariants();
    }

    for key in [4, 2, 6] {
        assert_eq!(tree.remove(&key).map(|node| node.key), Some(key));
        tree.assert_invariants();
    }

    assert_eq!(collect_keys(&tree), vec![1, 3, 5, 7]);
}

#[test]
fn order_two_find() {
    let mut tree: RgbTree<TestNode, 2> = RgbTree::new();

    for key in [5, 3, 7, 1, 9, 2, 4, 6, 8] {
        tree.insert(TestNode::new(key));
        tree.assert_invariants();
    }

    assert_eq!(tree.get(&6).map(|node| node.key), Some(6));
    assert!(tree.get(&10).is_none());
}

#[test]
fn order_three_skeleton_is_balanced() {
    let mut tree: RgbTree<TestNode, 3> = RgbTree::new();

    for key in 1..=15 {
        tree.insert(TestNode::new(key));
        tree.assert_invariants();
    }

    let mut counts = Vec::new();
    zero_counts(tree.root, 0, &mut counts);
    assert!(counts.windows(2).all(|pair| pair[0] == pair[1]));
}

#[test]
fn duplicate_keys_accrete_left() {
    let mut tree: RgbTree<TestNode, 1> = RgbTree::new();

    for key in [3, 5, 5, 5, 7] {
        tree.insert(TestNode::new(key));
        tree.assert_invariants();
    }

    assert_eq!(collect_keys(&tree), vec![3, 5, 5, 5, 7]);

    // The match found by descent is the shallowest of the equal group.
    let found = tree.get(&5).expect("item not found");
    let mut cur = tree.first();
    while let Some(node) = cur {
        if node.key == 5 {
            assert!(depth(found) <= depth(node));
        }

        cur = tree.next(node);
    }
}

#[test]
fn insert_remove_churn() {
    let mut tree: RgbTree<TestNode, 2> = RgbTree::new();

    for key in 1..=100 {
        tree.insert(TestNode::new(key));
        tree.assert_invariants();
        assert_eq!(collect_keys(&tree), (1..=key).collect::<Vec<_>>());
    }

    for key in 1..=100 {
        assert_eq!(tree.remove(&key).map(|node| node.key), Some(key));
        tree.assert_invariants();
        assert_eq!(collect_keys(&tree), (key + 1..=100).collect::<Vec<_>>());
    }

    assert!(tree.is_empty());
}

#[test]
fn next_walks_in_order() {
    let mut tree: RgbTree<TestNode, 2> = RgbTree::new();

    for key in [4, 8, 2, 6, 0] {
        tree.insert(TestNode::new(key));
    }

    let mut keys = Vec::new();
    let mut cur = tree.first();
    while let Some(node) = cur {
        keys.push(node.key);
        cur = tree.next(node);
    }

    assert_eq!(keys, vec![0, 2, 4, 6, 8]);
}

#[test]
fn validate_is_idempotent() {
    let mut tree: RgbTree<TestNode, 2> = RgbTree::new();

    for key in [5, 1, 9, 3, 7] {
        tree.insert(TestNode::new(key));
    }

    let before = fingerprint(&tree);
    let first = tree.validate();
    let second = tree.validate();

    assert_eq!(first, second);
    assert_eq!(first, Ok(()));
    assert_eq!(before, fingerprint(&tree));
}

#[test]
#[cfg_attr(miri, ignore)]
fn exhaustive_insert_sweep_order_1() {
    model::run_insert_sweep::<1>(9);
}

#[test]
#[cfg_attr(miri, ignore)]
fn exhaustive_insert_sweep_order_2() {
    model::run_insert_sweep::<2>(7);
}

#[test]
#[cfg_attr(miri, ignore)]
fn exhaustive_insert_sweep_order_3() {
    model::run_insert_sweep::<3>(5);
}

#[test]
#[cfg_attr(miri, ignore)]
fn exhaustive_remove_sweep_order_1() {
    model::run_remove_sweep::<1>(9);
}

#[test]
#[cfg_attr(miri, ignore)]
fn exhaustive_remove_sweep_order_2() {
    model::run_remove_sweep::<2>(7);
}

#[test]
#[cfg_attr(miri, ignore)]
fn exhaustive_remove_sweep_order_3() {
    model::run_remove_sweep::<3>(5);
}

#[cfg(miri)]
const FUZZ_RANGE: Range<usize> = 0..10;

#[cfg(not(miri))]
const FUZZ_RANGE: Range<usize> = 0..1000;

proptest::proptest! {
    #![proptest_config(ProptestConfig {
        max_shrink_iters: 65536,
        .. ProptestConfig::default()
    })]

    #[test]
    fn vec_equivalence_order_1(ops in proptest::collection::vec(model::op_strategy(), FUZZ_RANGE)) {
        model::run_vec_equivalence::<1>(ops);
    }

    #[test]
    fn vec_equivalence_order_2(ops in proptest::collection::vec(model::op_strategy(), FUZZ_RANGE)) {
        model::run_vec_equivalence::<2>(ops);
    }

    #[test]
    fn vec_equivalence_order_3(ops in proptest::collection::vec(model::op_strategy(), FUZZ_RANGE)) {
        model::run_vec_equivalence::<3>(ops);
    }

    #[test]
    fn round_trip_permutation(
        keys in proptest::collection::hash_set(0u32..1000, 0..64)
            .prop_map(|set| set.into_iter().collect::<Vec<_>>())
            .prop_shuffle()
    ) {
        let mut tree: RgbTree<TestNode, 2> = RgbTree::new();

        for &key in &keys {
            tree.insert(TestNode::new(key));
            tree.assert_invariants();
        }

        for key in &keys {
            prop_assert_eq!(tree.get(key).map(|node| node.key), Some(*key));
        }

        let mut sorted = keys.clone();
        sorted.sort_unstable();

        prop_assert_eq!(collect_keys(&tree), sorted);
    }
}
