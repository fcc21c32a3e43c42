use std::ptr::NonNull;

use cordyceps::Linked;
use rgb_tree::{Links, RgbTree, TreeNode};

#[repr(C)]
struct Entry {
    links: Links<Entry>,
    key: u32,
}

unsafe impl Linked<Links<Entry>> for Entry {
    type Handle = Box<Entry>;

    fn into_ptr(r: Self::Handle) -> NonNull<Self> {
        NonNull::new(Box::into_raw(r)).unwrap()
    }

    unsafe fn from_ptr(ptr: NonNull<Self>) -> Self::Handle {
        unsafe { Box::from_raw(ptr.as_ptr()) }
    }

    unsafe fn links(ptr: NonNull<Self>) -> NonNull<Links<Entry>> {
        // SAFETY: Self is #[repr(C)] and `links` is first field
        ptr.cast()
    }
}

impl TreeNode<Links<Entry>> for Entry {
    type Key = u32;

    fn key(&self) -> &Self::Key {
        &self.key
    }
}

fn main() {
    let mut tree: RgbTree<Entry, 2> = RgbTree::new();

    for key in [0, 2, 1, 3] {
        tree.insert(Box::new(Entry {
            links: Links::new(),
            key,
        }));
    }

    for elem in tree.iter() {
        println!("key: {}", elem.key);
    }

    for key in [0, 2, 1, 3] {
        let node = tree.get_raw(&key).expect("item not found");
        unsafe { tree.remove_at(node) };
        tree.assert_invariants();
    }

    drop(tree);
}
