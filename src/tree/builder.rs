use tracing::debug;

use crate::store::StoreNode;
use crate::tree::{ConfigTree, KeyPath};

impl ConfigTree {
    /// Builds the tree from a recursive snapshot of the watched directory.
    pub fn from_snapshot(snapshot: &StoreNode, watched_root: &str) -> Self {
        let mut tree = ConfigTree::new();
        tree.insert_children(snapshot, watched_root);
        debug!(
            "Built tree with {} leaves from snapshot of '{}'",
            tree.leaves().len(),
            watched_root
        );
        tree
    }

    fn insert_children(&mut self, node: &StoreNode, watched_root: &str) {
        for child in &node.nodes {
            let path = KeyPath::relative(&child.key, watched_root);
            if child.dir {
                self.ensure_directory(&path);
                self.insert_children(child, watched_root);
            } else {
                self.set_leaf(&path, child.value.as_deref().unwrap_or_default());
            }
        }
    }
}
