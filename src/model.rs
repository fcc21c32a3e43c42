extern crate std;

use std::{collections::HashMap, prelude::v1::*, ptr::NonNull, rc::Rc};

use arbitrary::Arbitrary;
use cordyceps::Linked;
use proptest::strategy::{Just, Strategy};

use crate::{Dir, Links, RgbTree, TreeNode, ValidateError};

#[derive(Debug)]
#[repr(C)]
pub struct TestNode {
    pub links: Links<TestNode>,
    pub key: u32,
}

impl TestNode {
    pub fn new(key: u32) -> Box<TestNode> {
        Box::new(TestNode {
            links: Links::new(),
            key,
        })
    }
}

unsafe impl Linked<Links<TestNode>> for TestNode {
    type Handle = Box<TestNode>;

    fn into_ptr(r: Self::Handle) -> NonNull<Self> {
        NonNull::new(Box::into_raw(r)).unwrap()
    }

    unsafe fn from_ptr(ptr: NonNull<Self>) -> Self::Handle {
        unsafe { Box::from_raw(ptr.as_ptr()) }
    }

    unsafe fn links(ptr: NonNull<Self>) -> NonNull<Links<TestNode>> {
        // SAFETY: Self is #[repr(C)] and `links` is first field
        ptr.cast()
    }
}

impl TreeNode<Links<TestNode>> for TestNode {
    type Key = u32;

    fn key(&self) -> &Self::Key {
        &self.key
    }
}

#[derive(Copy, Clone, Debug, Arbitrary)]
pub enum ItemValue {
    Index(usize),
    Random(u32),
}

proptest::prop_compose! {
    fn index_strategy()(
        index in 0usize..1000,
    ) -> ItemValue {
        ItemValue::Index(index)
    }
}

proptest::prop_compose! {
    fn random_strategy()(
        random in 0u32..1000,
    ) -> ItemValue {
        ItemValue::Random(random)
    }
}

fn value_strategy() -> impl Strategy<Value = ItemValue> {
    proptest::prop_oneof![index_strategy(), random_strategy()]
}

#[derive(Copy, Clone, Debug, Arbitrary)]
pub enum Op {
    Insert(ItemValue),
    Get(ItemValue),
    Remove(ItemValue),
    First,
    PopFirst,
    Last,
    PopLast,
}

impl Op {
    fn finalize(self, sorted: &[u32]) -> FinalOp {
        fn get_value(v: &[u32], i: ItemValue) -> u32 {
            match i {
                ItemValue::Index(idx) => {
                    if v.is_empty() {
                        idx as u32
                    } else {
                        v[idx % v.len().max(1)]
                    }
                }
                ItemValue::Random(v) => v,
            }
        }

        match self {
            Op::Insert(item) => FinalOp::Insert(get_value(sorted, item)),
            Op::Get(item) => FinalOp::Get(get_value(sorted, item)),
            Op::Remove(item) => FinalOp::Remove(get_value(sorted, item)),
            Op::First => FinalOp::First,
            Op::PopFirst => FinalOp::PopFirst,
            Op::Last => FinalOp::Last,
            Op::PopLast => FinalOp::PopLast,
        }
    }
}

#[derive(Copy, Clone, Debug)]
enum FinalOp {
    Insert(u32),
    Get(u32),
    Remove(u32),
    First,
    PopFirst,
    Last,
    PopLast,
}

pub fn op_strategy() -> impl Strategy<Value = Op> {
    proptest::prop_oneof![
        value_strategy().prop_map(Op::Insert),
        value_strategy().prop_map(Op::Get),
        value_strategy().prop_map(Op::Remove),
        Just(Op::First),
        Just(Op::PopFirst),
        Just(Op::Last),
        Just(Op::PopLast),
    ]
}

// Checks a sequence of operations against a sorted `Vec` kept as a multiset
// model. Duplicate keys are first-class: an insert of an existing key grows
// both structures, and a removal drops a single occurrence from each.
pub fn run_vec_equivalence<const ORDER: u8>(ops: Vec<Op>) {
    let mut model: Vec<u32> = Vec::with_capacity(ops.len());
    let mut tree: RgbTree<TestNode, ORDER> = RgbTree::new();

    #[inline]
    #[allow(clippy::boxed_local)]
    fn node_key(node: Box<TestNode>) -> u32 {
        node.key
    }

    for (op_id, op) in ops.into_iter().enumerate() {
        let final_op = op.finalize(&model);

        match final_op {
            FinalOp::Insert(value) => {
                let idx = model.partition_point(|&v| v <= value);
                model.insert(idx, value);

                tree.insert(TestNode::new(value));
            }

            FinalOp::Get(value) => {
                let from_model = model.binary_search(&value).ok().map(|_| value);
                let from_tree = tree.get(&value).map(|node| node.key);

                assert_eq!(from_model, from_tree, "FinalOp #{op_id}: {op:?}");
            }

            FinalOp::Remove(value) => {
                let from_model = model
                    .binary_search(&value)
                    .ok()
                    .map(|idx| model.remove(idx));
                let from_tree = tree.remove(&value).map(node_key);

                assert_eq!(from_model, from_tree, "FinalOp #{op_id}: {op:?}");
            }

            FinalOp::First => {
                let from_model = model.first().copied();
                let from_tree = tree.first().map(|node| node.key);

                assert_eq!(from_model, from_tree, "FinalOp #{op_id}: {op:?}");
            }

            FinalOp::PopFirst => {
                let from_model = (!model.is_empty()).then(|| model.remove(0));
                let from_tree = tree.pop_first().map(node_key);

                assert_eq!(from_model, from_tree, "FinalOp #{op_id}: {op:?}");
            }

            FinalOp::Last => {
                let from_model = model.last().copied();
                let from_tree = tree.last().map(|node| node.key);

                assert_eq!(from_model, from_tree, "FinalOp #{op_id}: {op:?}");
            }

            FinalOp::PopLast => {
                let from_model = model.pop();
                let from_tree = tree.pop_last().map(node_key);

                assert_eq!(from_model, from_tree, "FinalOp #{op_id}: {op:?}");
            }
        }

        tree.assert_invariants();
        assert_eq!(model.len(), tree.len());
        assert!(model.iter().zip(tree.iter()).all(|(&a, b)| a == b.key));
    }
}

// A node shape plus color assignment, used by the exhaustive small-tree
// sweep. Subtrees are shared through `Rc` so the full enumeration for a
// given node budget fits in memory.
pub(crate) struct Sketch {
    color: u8,
    left: Option<Rc<Sketch>>,
    right: Option<Rc<Sketch>>,
}

type SketchSet = Rc<Vec<Option<Rc<Sketch>>>>;
type SketchMemo = HashMap<(usize, u8), SketchSet>;

// Enumerates every subtree of `count` nodes whose root color is at most
// `cap`, under the decreasing-color rule for trees of order `order`. The
// zero-balance rule is deliberately not enforced.
fn subtrees(count: usize, cap: u8, order: u8, memo: &mut SketchMemo) -> SketchSet {
    if let Some(hit) = memo.get(&(count, cap)) {
        return Rc::clone(hit);
    }

    let mut out = Vec::new();

    if count == 0 {
        out.push(None);
    } else {
        for color in 0..=cap {
            let child_cap = if color == 0 { order } else { color - 1 };

            for left_count in 0..count {
                let lefts = subtrees(left_count, child_cap, order, memo);
                let rights = subtrees(count - 1 - left_count, child_cap, order, memo);

                for left in lefts.iter() {
                    for right in rights.iter() {
                        out.push(Some(Rc::new(Sketch {
                            color,
                            left: left.clone(),
                            right: right.clone(),
                        })));
                    }
                }
            }
        }
    }

    let out = Rc::new(out);
    memo.insert((count, cap), Rc::clone(&out));

    out
}

// Returns the sketch's 0-height if every path through it crosses the same
// number of color-0 nodes, or `None` if the sketch is imbalanced.
fn sketch_zero_height(sketch: Option<&Rc<Sketch>>) -> Option<usize> {
    let Some(sketch) = sketch else {
        return Some(0);
    };

    let left = sketch_zero_height(sketch.left.as_ref())?;
    let right = sketch_zero_height(sketch.right.as_ref())?;

    (left == right).then_some(left + usize::from(sketch.color == 0))
}

// Materializes a sketch as a live tree, assigning keys 1, 3, 5, … in
// in-order position.
fn build_node(sketch: &Sketch, next_key: &mut u32) -> NonNull<TestNode> {
    let ptr = TestNode::into_ptr(TestNode::new(0));

    unsafe {
        if let Some(left) = &sketch.left {
            let child = build_node(left, next_key);
            TestNode::links(ptr)
                .as_mut()
                .set_child(Dir::Left, Some(child));
            TestNode::links(child).as_mut().set_parent(Some(ptr));
        }

        (*ptr.as_ptr()).key = *next_key;
        *next_key += 2;

        if let Some(right) = &sketch.right {
            let child = build_node(right, next_key);
            TestNode::links(ptr)
                .as_mut()
                .set_child(Dir::Right, Some(child));
            TestNode::links(child).as_mut().set_parent(Some(ptr));
        }

        TestNode::links(ptr).as_mut().set_color(sketch.color);
    }

    ptr
}

fn build_tree<const ORDER: u8>(sketch: Option<&Rc<Sketch>>) -> RgbTree<TestNode, ORDER> {
    let Some(sketch) = sketch else {
        return RgbTree::new();
    };

    let mut next_key = 1;
    let root = build_node(sketch, &mut next_key);

    RgbTree {
        root: Some(root),
        len: (next_key as usize - 1) / 2,
    }
}

// Inserts every even key into a fresh copy of every enumerated tree of up
// to `max_count` nodes. A copy built without zero balance may validate as
// imbalanced afterwards; any other defect is a repair bug.
pub fn run_insert_sweep<const ORDER: u8>(max_count: usize) {
    let mut memo = SketchMemo::new();

    for count in 0..=max_count {
        let sketches = subtrees(count, ORDER, ORDER, &mut memo);

        for sketch in sketches.iter() {
            let balanced = sketch_zero_height(sketch.as_ref()).is_some();

            for key in (0..=2 * count as u32).step_by(2) {
                let mut tree = build_tree::<ORDER>(sketch.as_ref());
                tree.insert(TestNode::new(key));

                match tree.validate() {
                    Ok(()) => {}
                    Err(ValidateError::InvalidBalance) if !balanced => {}
                    Err(err) => panic!(
                        "insert of {key} into a {count}-node tree of order {ORDER} \
                         left a defect: {err}"
                    ),
                }
            }
        }
    }
}

// Removes every in-order key from a fresh copy of every enumerated tree of
// up to `max_count` nodes. Removal repair assumes zero balance held going
// in, so the sweep runs on the balanced subset of the enumeration.
pub fn run_remove_sweep<const ORDER: u8>(max_count: usize) {
    let mut memo = SketchMemo::new();

    for count in 1..=max_count {
        for sketch in subtrees(count, ORDER, ORDER, &mut memo).iter().flatten() {
            if sketch_zero_height(Some(sketch)).is_none() {
                continue;
            }

            for key in (1..2 * count as u32).step_by(2) {
                let mut tree = build_tree::<ORDER>(Some(sketch));
                let node = tree.get_raw(&key).expect("in-order key is present");

                drop(unsafe { tree.remove_at(node) });

                if let Err(err) = tree.validate() {
                    panic!(
                        "removal of {key} from a balanced {count}-node tree of order {ORDER} \
                         left a defect: {err}"
                    );
                }
            }
        }
    }
}
