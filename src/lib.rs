//! An intrusive RGB tree: a red-black tree generalized to `N + 1` colors.

// Conventions used in comments:
// - The color of a node `x` is denoted `c(x)`, with `0 <= c(x) <= N`.
// - Color-0 nodes form the tree's skeleton. The 0-height of a node is the
//   number of color-0 nodes on any path from the node down through its
//   subtree, counting the node itself if it has color 0.
//
// The fundamental invariants of an RGB tree of order N are:
// 1. Keys in a node's left subtree compare less than or equal to the node's
//    key; keys in its right subtree compare greater than or equal.
// 2. A node with nonzero color only has children of strictly smaller color.
//    Children of a color-0 node are unconstrained.
// 3. Every path from a node down to a leaf passes through the same number of
//    color-0 nodes.
//
// Corollaries:
// 4. Nonzero colors strictly decrease along a path, so at most N nodes
//    separate consecutive color-0 nodes. The height of the tree is at most
//    (N + 1) times its 0-height, which is O(log n).
// 5. With N = 1 the structure is exactly a red-black tree: color 0 is black,
//    color 1 is red, and rule 2 forbids adjacent color-1 nodes.

use core::{
    cell::UnsafeCell, cmp::Ordering, fmt, marker::PhantomPinned, mem, ops::Not, pin::Pin,
    ptr::NonNull,
};

use cordyceps::Linked;

pub use crate::iter::{Iter, IterMut};

mod iter;
#[cfg(any(test, feature = "model"))]
pub mod model;
#[cfg(test)]
mod tests;

pub(crate) type Link<T> = Option<NonNull<T>>;

/// A side of a binary node, selecting one of its two child slots.
///
/// Every structural algorithm in this crate is written once over a direction
/// `d` and its inverse `!d` rather than duplicated for left and right.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Dir {
    Left = 0,
    Right = 1,
}

impl Not for Dir {
    type Output = Dir;

    #[inline]
    fn not(self) -> Dir {
        match self {
            Dir::Left => Dir::Right,
            Dir::Right => Dir::Left,
        }
    }
}

/// Trait implemented by types which can be members of an [`RgbTree`].
///
/// The tree never inspects the containing record. It recovers the key of an
/// entry through [`TreeNode::key`] and orders entries by `Ord` on
/// [`TreeNode::Key`]; the pointer-level embedding is inherited from
/// [`cordyceps::Linked`]. Neither projection may mutate tree state.
pub trait TreeNode<L>: Linked<L> {
    type Key: Ord;

    fn key(&self) -> &Self::Key;
}

/// Links to other nodes in an [`RgbTree`].
///
/// A member type embeds one instance of this type and reaches it via its
/// [`Linked::links`] implementation. Links are created unlinked and colorless
/// and are reset when their node leaves the tree.
pub struct Links<T: ?Sized> {
    inner: UnsafeCell<LinksInner<T>>,
}

struct LinksInner<T: ?Sized> {
    parent: Link<T>,
    children: [Link<T>; 2],
    color: u8,
    _unpin: PhantomPinned,
}

/// A structural defect reported by [`RgbTree::validate`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ValidateError {
    /// A child's parent link does not point back at the node holding it, or
    /// the root's parent link is set.
    InvalidParent,
    /// A node with nonzero color has a child of equal or greater color.
    InvalidDecrease,
    /// A child's key is on the wrong side of its parent's key.
    InvalidOrder,
    /// Two sibling subtrees disagree on the number of color-0 nodes per path.
    InvalidBalance,
}

impl fmt::Display for ValidateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let msg = match self {
            ValidateError::InvalidParent => "child's parent link does not match",
            ValidateError::InvalidDecrease => "child color does not decrease",
            ValidateError::InvalidOrder => "child key on the wrong side",
            ValidateError::InvalidBalance => "subtrees differ in color-0 count",
        };

        f.write_str(msg)
    }
}

/// An intrusive RGB tree of order `N`.
///
/// The tree stores caller-owned entries linked through an embedded
/// [`Links<T>`] field and keeps them ordered by key. Each node carries a
/// color in `0..=N`; the color-0 nodes form a balanced skeleton, and `N`
/// bounds how long a run of nonzero colors may grow between them. `N = 1`
/// behaves exactly like a red-black tree.
///
/// The tree allocates nothing. An entry handed to [`insert`][RgbTree::insert]
/// must stay live and unmoved until it is removed or the tree is dropped.
pub struct RgbTree<T, const N: u8>
where
    T: TreeNode<Links<T>> + ?Sized,
{
    root: Link<T>,
    len: usize,
}

impl<T, const N: u8> RgbTree<T, N>
where
    T: TreeNode<Links<T>> + ?Sized,
{
    /// Creates a new, empty tree.
    #[must_use]
    pub const fn new() -> RgbTree<T, N> {
        assert!(N >= 1, "an RGB tree requires at least one nonzero color");

        RgbTree { root: None, len: 0 }
    }

    /// Returns the color parameter `N`.
    pub const fn order(&self) -> u8 {
        N
    }

    /// Returns the number of entries in the tree.
    pub const fn len(&self) -> usize {
        self.len
    }

    /// Returns `true` if the tree contains no entries.
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Returns a reference to the entry whose key equals `key`.
    ///
    /// If several entries share the key, the shallowest one is returned.
    pub fn get(&self, key: &T::Key) -> Option<&T> {
        self.get_raw(key).map(|node| unsafe { node.as_ref() })
    }

    /// Returns a pinned mutable reference to the entry whose key equals
    /// `key`.
    ///
    /// The entry's key must not be changed through the returned reference in
    /// a way that reorders it relative to other entries.
    pub fn get_mut(&mut self, key: &T::Key) -> Option<Pin<&mut T>> {
        self.get_raw(key)
            .map(|mut node| unsafe { Pin::new_unchecked(node.as_mut()) })
    }

    /// Returns `true` if an entry with the given key is in the tree.
    pub fn contains_key(&self, key: &T::Key) -> bool {
        self.get_raw(key).is_some()
    }

    /// Returns a raw pointer to the entry whose key equals `key`.
    ///
    /// Equal-comparing keys are never searched past, so the returned entry is
    /// the first match on the path from the root, which is also the
    /// shallowest.
    pub fn get_raw(&self, key: &T::Key) -> Option<NonNull<T>> {
        let mut cur = self.root;

        loop {
            let node = cur?;

            cur = unsafe {
                match key.cmp(node.as_ref().key()) {
                    Ordering::Equal => return Some(node),
                    Ordering::Less => T::links(node).as_ref().child(Dir::Left),
                    Ordering::Greater => T::links(node).as_ref().child(Dir::Right),
                }
            };
        }
    }

    /// Returns a reference to the minimum entry.
    pub fn first(&self) -> Option<&T> {
        self.root
            .map(|root| unsafe { Self::min_in_subtree(root).as_ref() })
    }

    /// Returns a reference to the maximum entry.
    pub fn last(&self) -> Option<&T> {
        self.root
            .map(|root| unsafe { Self::max_in_subtree(root).as_ref() })
    }

    /// Returns the in-order successor of `node`, or `None` if `node` holds
    /// the maximum key.
    ///
    /// `node` must be an entry of this tree.
    pub fn next<'tree>(&'tree self, node: &T) -> Option<&'tree T> {
        unsafe {
            self.successor_raw(NonNull::from(node))
                .map(|succ| succ.as_ref())
        }
    }

    /// Gets an iterator over the entries of the tree in ascending key order.
    pub fn iter(&self) -> Iter<'_, T, N> {
        Iter::new(self)
    }

    /// Gets a mutable iterator over the entries of the tree in ascending key
    /// order.
    ///
    /// Keys must not be changed through the yielded references in a way that
    /// reorders entries.
    pub fn iter_mut(&mut self) -> IterMut<'_, T, N> {
        IterMut::new(self)
    }

    /// Inserts a caller-owned entry into the tree.
    ///
    /// Entries comparing equal to an existing key are placed in that entry's
    /// left subtree, so a later [`get`][RgbTree::get] returns the shallowest
    /// of the equal group.
    ///
    /// # Panics
    ///
    /// Panics if the entry's links are already in use by a tree.
    pub fn insert(&mut self, item: T::Handle) {
        unsafe {
            let ptr = T::into_ptr(item);

            assert!(
                !T::links(ptr).as_ref().is_linked(),
                "entry is already linked into a tree"
            );
            T::links(ptr).as_mut().set_color(0);

            let Some(root) = self.root else {
                self.root = Some(ptr);
                self.len += 1;
                return;
            };

            // Descend to the open slot the new key belongs in.
            let mut cur = root;
            let dir = loop {
                let dir = match ptr.as_ref().key().cmp(cur.as_ref().key()) {
                    Ordering::Less | Ordering::Equal => Dir::Left,
                    Ordering::Greater => Dir::Right,
                };

                match T::links(cur).as_ref().child(dir) {
                    Some(child) => cur = child,
                    None => break dir,
                }
            };

            self.set_child(cur, dir, Some(ptr));
            self.len += 1;

            self.color_for_parent(ptr, cur);
        }
    }

    /// Removes the entry whose key equals `key` and returns its handle.
    ///
    /// If several entries share the key, the shallowest one is removed.
    pub fn remove(&mut self, key: &T::Key) -> Option<T::Handle> {
        let node = self.get_raw(key)?;

        Some(unsafe { self.remove_at(node) })
    }

    /// Removes the entry at `node` and returns its handle.
    ///
    /// # Safety
    ///
    /// `node` must be an entry of this tree. Removing a detached link or a
    /// member of another tree corrupts the structure.
    pub unsafe fn remove_at(&mut self, node: NonNull<T>) -> T::Handle {
        unsafe {
            let left = T::links(node).as_ref().child(Dir::Left);
            let right = T::links(node).as_ref().child(Dir::Right);

            if let (Some(_), Some(right)) = (left, right) {
                // The in-order successor has no left child, so it is spliced
                // out of its own position first and then substituted into the
                // removed node's place, taking over its children and color.
                // The substitution needs no further repair because the
                // color-0 count of every affected path is unchanged.
                let succ = Self::min_in_subtree(right);
                self.splice(succ);
                self.transplant(node, succ);
            } else {
                self.splice(node);
            }

            T::links(node).as_mut().clear();
            self.len -= 1;

            T::from_ptr(node)
        }
    }

    /// Removes the minimum entry and returns its handle.
    pub fn pop_first(&mut self) -> Option<T::Handle> {
        let root = self.root?;
        let first = unsafe { Self::min_in_subtree(root) };

        Some(unsafe { self.remove_at(first) })
    }

    /// Removes the maximum entry and returns its handle.
    pub fn pop_last(&mut self) -> Option<T::Handle> {
        let root = self.root?;
        let last = unsafe { Self::max_in_subtree(root) };

        Some(unsafe { self.remove_at(last) })
    }

    /// Removes all entries from the tree, dropping their handles.
    pub fn clear(&mut self) {
        if let Some(root) = self.root.take() {
            unsafe { Self::clear_subtree(root) };
        }

        self.len = 0;
    }

    /// Checks every invariant over the whole tree.
    ///
    /// Read-only; calling it any number of times between operations returns
    /// the same verdict and leaves the tree untouched.
    pub fn validate(&self) -> Result<(), ValidateError> {
        let Some(root) = self.root else {
            return Ok(());
        };

        unsafe {
            if T::links(root).as_ref().parent().is_some() {
                return Err(ValidateError::InvalidParent);
            }

            self.validate_at(root).map(|_zero_height| ())
        }
    }

    /// Panics if [`validate`][RgbTree::validate] reports a defect.
    #[track_caller]
    pub fn assert_invariants(&self) {
        if let Err(err) = self.validate() {
            panic!("tree invariant violated: {err}");
        }
    }

    // Returns the 0-height of the subtree rooted at `node`, or the first
    // defect found.
    unsafe fn validate_at(&self, node: NonNull<T>) -> Result<usize, ValidateError> {
        unsafe {
            let color = T::links(node).as_ref().color();
            let mut heights = [0usize; 2];

            for dir in [Dir::Left, Dir::Right] {
                let Some(child) = T::links(node).as_ref().child(dir) else {
                    continue;
                };

                if T::links(child).as_ref().parent() != Some(node) {
                    return Err(ValidateError::InvalidParent);
                }

                if color > 0 && T::links(child).as_ref().color() >= color {
                    return Err(ValidateError::InvalidDecrease);
                }

                let misordered = match dir {
                    Dir::Left => child.as_ref().key().cmp(node.as_ref().key()) == Ordering::Greater,
                    Dir::Right => child.as_ref().key().cmp(node.as_ref().key()) == Ordering::Less,
                };

                if misordered {
                    return Err(ValidateError::InvalidOrder);
                }

                heights[dir as usize] = self.validate_at(child)?;
            }

            if heights[0] != heights[1] {
                return Err(ValidateError::InvalidBalance);
            }

            Ok(heights[0] + usize::from(color == 0))
        }
    }

    // Returns the leftmost node of the subtree rooted at `root`.
    pub(crate) unsafe fn min_in_subtree(root: NonNull<T>) -> NonNull<T> {
        let mut cur = root;

        while let Some(left) = unsafe { T::links(cur).as_ref().child(Dir::Left) } {
            cur = left;
        }

        cur
    }

    // Returns the rightmost node of the subtree rooted at `root`.
    unsafe fn max_in_subtree(root: NonNull<T>) -> NonNull<T> {
        let mut cur = root;

        while let Some(right) = unsafe { T::links(cur).as_ref().child(Dir::Right) } {
            cur = right;
        }

        cur
    }

    // Returns the in-order successor of `node`.
    //
    // If `node` has a right subtree, the successor is its minimum. Otherwise
    // it is the first ancestor reached from a left subtree.
    pub(crate) unsafe fn successor_raw(&self, node: NonNull<T>) -> Link<T> {
        unsafe {
            if let Some(right) = T::links(node).as_ref().child(Dir::Right) {
                return Some(Self::min_in_subtree(right));
            }

            let mut cur = node;
            while let Some(parent) = T::links(cur).as_ref().parent() {
                if self.which_child(parent, Some(cur)) == Dir::Left {
                    return Some(parent);
                }

                cur = parent;
            }

            None
        }
    }

    // Returns the direction under which `child` sits in `parent`.
    fn which_child(&self, parent: NonNull<T>, child: Link<T>) -> Dir {
        if unsafe { T::links(parent).as_ref().child(Dir::Left) } == child {
            Dir::Left
        } else {
            debug_assert_eq!(
                unsafe { T::links(parent).as_ref().child(Dir::Right) },
                child,
                "`child` must be a child of `parent`"
            );

            Dir::Right
        }
    }

    // Assigns `child` to the `dir` slot of `node` and points `child` back at
    // `node`. The previous occupant of the slot is not touched.
    unsafe fn set_child(&mut self, node: NonNull<T>, dir: Dir, child: Link<T>) {
        unsafe {
            T::links(node).as_mut().set_child(dir, child);

            if let Some(child) = child {
                T::links(child).as_mut().set_parent(Some(node));
            }
        }
    }

    // Reslots `new` where `old` currently sits under `parent`, or at the tree
    // root when `parent` is `None`. `old`'s own links are left untouched.
    unsafe fn replace_child(&mut self, parent: Link<T>, old: NonNull<T>, new: Link<T>) {
        unsafe {
            match parent {
                Some(parent) => {
                    let dir = self.which_child(parent, Some(old));
                    T::links(parent).as_mut().set_child(dir, new);

                    if let Some(new) = new {
                        T::links(new).as_mut().set_parent(Some(parent));
                    }
                }

                None => {
                    debug_assert_eq!(self.root, Some(old));
                    self.root = new;

                    if let Some(new) = new {
                        T::links(new).as_mut().set_parent(None);
                    }
                }
            }
        }
    }

    // Transplants `new` into `old`'s position: `new` adopts `old`'s parent
    // slot, both children, and color.
    unsafe fn transplant(&mut self, old: NonNull<T>, new: NonNull<T>) {
        unsafe {
            let parent = T::links(old).as_ref().parent();
            let left = T::links(old).as_ref().child(Dir::Left);
            let right = T::links(old).as_ref().child(Dir::Right);
            let color = T::links(old).as_ref().color();

            self.replace_child(parent, old, Some(new));
            self.set_child(new, Dir::Left, left);
            self.set_child(new, Dir::Right, right);
            T::links(new).as_mut().set_color(color);
        }
    }

    // Single rotation of `down` in direction `dir`: the child opposite `dir`
    // is hoisted into `down`'s place and `down` becomes its `dir` child. The
    // two nodes swap colors, which keeps the decreasing-color rule intact in
    // the rotation cases used by the repair algorithms.
    unsafe fn rotate(&mut self, dir: Dir, down: NonNull<T>) {
        unsafe {
            let up = T::links(down)
                .as_ref()
                .child(!dir)
                .expect("rotation requires a child opposite the direction");
            let parent = T::links(down).as_ref().parent();

            let across = T::links(up).as_ref().child(dir);
            T::links(down).as_mut().set_child(!dir, across);
            if let Some(across) = across {
                T::links(across).as_mut().set_parent(Some(down));
            }

            T::links(up).as_mut().set_child(dir, Some(down));
            T::links(down).as_mut().set_parent(Some(up));

            let down_color = T::links(down).as_ref().color();
            let up_color = T::links(up).as_ref().color();
            T::links(down).as_mut().set_color(up_color);
            T::links(up).as_mut().set_color(down_color);

            self.replace_child(parent, down, Some(up));
        }
    }

    // Colors `node` for its position under `parent`.
    //
    // A color-0 parent admits the maximum color, starting a fresh decreasing
    // chain. A parent of color 1 has no strictly smaller nonzero color to
    // offer, and color 0 would change the color-0 count of the path, so the
    // node takes the parent's color and the resulting violation is repaired.
    // Any other parent admits one less than its own color.
    unsafe fn color_for_parent(&mut self, node: NonNull<T>, parent: NonNull<T>) {
        unsafe {
            match T::links(parent).as_ref().color() {
                0 => T::links(node).as_mut().set_color(N),
                1 => {
                    T::links(node).as_mut().set_color(1);

                    let dir = self.which_child(parent, Some(node));
                    self.repair_color_violation(dir, parent);
                }
                color => T::links(node).as_mut().set_color(color - 1),
            }
        }
    }

    // Restores the decreasing-color rule after `link`'s child in direction
    // `d` has been given the same nonzero color as `link`.
    //
    // Rotation is preferred over recoloring whenever the sibling permits it;
    // the rotation's color swap settles the violation on the spot. Otherwise
    // the link is promoted one color step, which may move the violation to
    // its parent. A link already at the maximum color pushes its level down
    // instead: both children of the (necessarily color-0) parent join the
    // skeleton and the parent is recolored from above. Each path through that
    // subtree gains one color-0 node below the parent and loses the one at
    // the parent, so its color-0 count is unchanged.
    unsafe fn repair_color_violation(&mut self, d: Dir, link: NonNull<T>) {
        unsafe {
            let link_color = T::links(link).as_ref().color();

            debug_assert!(link_color > 0);
            debug_assert_eq!(
                Self::link_color(T::links(link).as_ref().child(d)),
                link_color
            );

            let Some(parent) = T::links(link).as_ref().parent() else {
                // A violation at the root promotes the whole tree onto a new
                // base level.
                T::links(link).as_mut().set_color(0);
                return;
            };

            let ld = self.which_child(parent, Some(link));
            let sibling = T::links(parent).as_ref().child(!ld);
            let can_rotate = sibling.is_none() || Self::link_color(sibling) < link_color;

            if can_rotate {
                if ld == d {
                    self.rotate(!ld, parent);
                } else {
                    self.rotate(!d, link);
                    self.rotate(!ld, parent);
                }
            } else if link_color < N {
                T::links(link).as_mut().set_color(link_color + 1);

                if T::links(parent).as_ref().color() == link_color + 1 {
                    self.repair_color_violation(ld, parent);
                }
            } else {
                // The sibling matches the maximum color, so the parent must
                // be color 0.
                debug_assert_eq!(T::links(parent).as_ref().color(), 0);

                let sibling = sibling.expect("a sibling at the maximum color is present");
                T::links(link).as_mut().set_color(0);
                T::links(sibling).as_mut().set_color(0);

                if let Some(grandparent) = T::links(parent).as_ref().parent() {
                    self.color_for_parent(parent, grandparent);
                }
            }
        }
    }

    // Removes a node with at most one child by lifting that child into its
    // place. Splicing out a color-0 node leaves its side of the parent one
    // color-0 node short, which the zero-imbalance repair restores. Splicing
    // the root instead shrinks the global 0-height by one, which needs no
    // repair.
    unsafe fn splice(&mut self, node: NonNull<T>) {
        unsafe {
            debug_assert!(
                T::links(node).as_ref().child(Dir::Left).is_none()
                    || T::links(node).as_ref().child(Dir::Right).is_none()
            );

            let parent = T::links(node).as_ref().parent();
            let child = T::links(node)
                .as_ref()
                .child(Dir::Left)
                .or(T::links(node).as_ref().child(Dir::Right));

            let dir = parent.map(|p| self.which_child(p, Some(node)));
            self.replace_child(parent, node, child);

            if T::links(node).as_ref().color() == 0 {
                if let (Some(parent), Some(dir)) = (parent, dir) {
                    self.repair_zero_imbalance(parent, dir);
                }
            }
        }
    }

    // Restores equal color-0 counts under `link` after the subtree in its
    // `d` slot lost one color-0 node relative to its sibling.
    unsafe fn repair_zero_imbalance(&mut self, link: NonNull<T>, d: Dir) {
        unsafe {
            // A nonzero node atop the short side can simply join the
            // skeleton.
            if let Some(short) = T::links(link).as_ref().child(d) {
                if T::links(short).as_ref().color() != 0 {
                    T::links(short).as_mut().set_color(0);
                    return;
                }
            }

            let other = T::links(link)
                .as_ref()
                .child(!d)
                .expect("the taller side of a zero imbalance is nonempty");

            if T::links(other).as_ref().color() != 0 {
                // Rotating a nonzero sibling up pulls its subtree onto the
                // short side. The slot is then occupied by one of the
                // sibling's former children, whose color is strictly smaller,
                // so after at most N - 1 repetitions a color-0 sibling
                // surfaces and one of the cases below applies.
                self.rotate(d, link);
                self.repair_zero_imbalance(link, d);
                return;
            }

            let outer = T::links(other).as_ref().child(!d);
            let inner = T::links(other).as_ref().child(d);

            if Self::link_color(outer) < N && Self::link_color(inner) < N {
                // Repainting the color-0 sibling to the maximum color removes
                // one color-0 node from the taller side, equalizing the two
                // children. `link` either joins the skeleton to keep its own
                // balance with its sibling, or was color 0 already and the
                // deficit moves up one level. At the root, a global 0-height
                // decrease is fine.
                T::links(other).as_mut().set_color(N);

                if T::links(link).as_ref().color() > 0 {
                    T::links(link).as_mut().set_color(0);
                } else if let Some(parent) = T::links(link).as_ref().parent() {
                    let ld = self.which_child(parent, Some(link));
                    self.repair_zero_imbalance(parent, ld);
                }
            } else if Self::link_color(outer) != 0 {
                let outer = outer.expect("a nonzero color implies a present child");

                T::links(outer).as_mut().set_color(0);
                self.rotate(d, link);
            } else {
                let inner = inner.expect("a nonzero color implies a present child");
                debug_assert_ne!(T::links(inner).as_ref().color(), 0);

                T::links(inner).as_mut().set_color(0);
                self.rotate(!d, other);
                self.rotate(d, link);
            }
        }
    }

    // Returns the color of a possibly-absent node; an absent node counts as
    // color 0.
    unsafe fn link_color(link: Link<T>) -> u8 {
        match link {
            Some(node) => unsafe { T::links(node).as_ref().color() },
            None => 0,
        }
    }

    unsafe fn clear_subtree(node: NonNull<T>) {
        unsafe {
            if let Some(left) = T::links(node).as_ref().child(Dir::Left) {
                Self::clear_subtree(left);
            }

            if let Some(right) = T::links(node).as_ref().child(Dir::Right) {
                Self::clear_subtree(right);
            }

            T::links(node).as_mut().clear();
            drop(T::from_ptr(node));
        }
    }
}

impl<T, const N: u8> Default for RgbTree<T, N>
where
    T: TreeNode<Links<T>> + ?Sized,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<T, const N: u8> Drop for RgbTree<T, N>
where
    T: TreeNode<Links<T>> + ?Sized,
{
    fn drop(&mut self) {
        self.clear();
    }
}

impl<T: ?Sized> Links<T> {
    /// Returns new, unlinked links.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            inner: UnsafeCell::new(LinksInner {
                parent: None,
                children: [None; 2],
                color: 0,
                _unpin: PhantomPinned,
            }),
        }
    }

    /// Returns `true` if this node is currently a member of a tree.
    ///
    /// A detached root is indistinguishable from a fresh link, so this may
    /// return `false` for the sole entry of a tree.
    pub fn is_linked(&self) -> bool {
        unsafe {
            let inner = &*self.inner.get();

            inner.parent.is_some() || inner.children[0].is_some() || inner.children[1].is_some()
        }
    }

    #[inline]
    fn parent(&self) -> Link<T> {
        unsafe { (*self.inner.get()).parent }
    }

    #[inline]
    fn child(&self, dir: Dir) -> Link<T> {
        unsafe { (*self.inner.get()).children[dir as usize] }
    }

    #[inline]
    fn color(&self) -> u8 {
        unsafe { (*self.inner.get()).color }
    }

    #[inline]
    fn set_parent(&mut self, parent: Link<T>) -> Link<T> {
        mem::replace(&mut self.inner.get_mut().parent, parent)
    }

    #[inline]
    fn set_child(&mut self, dir: Dir, child: Link<T>) -> Link<T> {
        mem::replace(&mut self.inner.get_mut().children[dir as usize], child)
    }

    #[inline]
    fn set_color(&mut self, color: u8) {
        self.inner.get_mut().color = color;
    }

    #[inline]
    fn clear(&mut self) {
        self.set_parent(None);
        self.set_child(Dir::Left, None);
        self.set_child(Dir::Right, None);
        self.set_color(0);
    }
}

impl<T: ?Sized> Default for Links<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: ?Sized> fmt::Debug for Links<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Links")
            .field("self", &format_args!("{self:p}"))
            .field("color", &self.color())
            .field("parent", &self.parent())
            .field("left", &self.child(Dir::Left))
            .field("right", &self.child(Dir::Right))
            .finish()
    }
}
