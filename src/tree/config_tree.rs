use std::collections::BTreeMap;

use derive_more::IsVariant;
use serde::Serialize;
use tracing::{debug, warn};

use crate::store::Action;
use crate::tree::KeyPath;

/// A single entry of the tree: either a terminal value or a directory of further entries.
#[derive(Debug, Clone, PartialEq, Eq, IsVariant, Serialize)]
#[serde(untagged)]
pub enum ConfigNode {
    Leaf(String),
    Directory(ConfigTree),
}

impl ConfigNode {
    #[cfg(test)]
    pub fn as_leaf(&self) -> Option<&str> {
        match self {
            ConfigNode::Leaf(value) => Some(value),
            ConfigNode::Directory(_) => None,
        }
    }

    #[cfg(test)]
    pub fn as_directory(&self) -> Option<&ConfigTree> {
        match self {
            ConfigNode::Leaf(_) => None,
            ConfigNode::Directory(tree) => Some(tree),
        }
    }

    /// Returns the directory stored in this node, turning a leaf into an empty directory first.
    fn directory_or_replace(&mut self, segment: &str) -> &mut ConfigTree {
        match self {
            ConfigNode::Directory(tree) => tree,
            ConfigNode::Leaf(value) => {
                warn!(
                    "Replacing leaf '{}' (value '{}') with a directory",
                    segment, value
                );
                *self = ConfigNode::Directory(ConfigTree::new());
                self.directory_or_replace(segment)
            }
        }
    }
}

/// In-memory mirror of the watched directory.
///
/// Children are kept sorted, so two trees holding the same entries compare equal
/// and render identically no matter in which order the entries arrived.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ConfigTree {
    children: BTreeMap<String, ConfigNode>,
}

impl ConfigTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Applies a single change to the tree in place.
    ///
    /// Writes create every missing intermediate directory. Removals of an address that
    /// does not exist leave the tree untouched.
    pub fn apply(&mut self, path: &[String], action: Action, value: Option<&str>, dir: bool) {
        let Some((last, parents)) = path.split_last() else {
            self.apply_to_root(action, dir);
            return;
        };

        if action.is_removal() {
            match self.directory_mut(parents) {
                Some(parent) => {
                    parent.children.remove(last);
                }
                None => debug!("Nothing to remove at '{}'", path.join("/")),
            }
            return;
        }

        let parent = self.ensure_directory(parents);
        if dir {
            parent
                .children
                .entry(last.clone())
                .or_insert_with(|| ConfigNode::Directory(ConfigTree::new()))
                .directory_or_replace(last);
        } else {
            parent.children.insert(
                last.clone(),
                ConfigNode::Leaf(value.unwrap_or_default().to_string()),
            );
        }
    }

    /// Sets a leaf value, creating intermediate directories as needed.
    pub fn set_leaf(&mut self, path: &[String], value: &str) {
        self.apply(path, Action::Set, Some(value), false);
    }

    /// Walks down `path`, creating empty directories where nothing exists yet.
    pub fn ensure_directory(&mut self, path: &[String]) -> &mut ConfigTree {
        let mut current = self;
        for segment in path {
            current = current
                .children
                .entry(segment.clone())
                .or_insert_with(|| ConfigNode::Directory(ConfigTree::new()))
                .directory_or_replace(segment);
        }
        current
    }

    #[cfg(test)]
    pub fn get<S: AsRef<str>>(&self, path: &[S]) -> Option<&ConfigNode> {
        let (last, parents) = path.split_last()?;
        let parent = parents.iter().try_fold(self, |current, segment| {
            current.children.get(segment.as_ref())?.as_directory()
        })?;
        parent.children.get(last.as_ref())
    }

    #[cfg(test)]
    pub fn get_value<S: AsRef<str>>(&self, path: &[S]) -> Option<&str> {
        self.get(path)?.as_leaf()
    }

    /// All leaves of the tree with their addresses, in sorted depth-first order.
    pub fn leaves(&self) -> Vec<(KeyPath, String)> {
        let mut leaves = Vec::new();
        self.collect_leaves(&KeyPath::root(), &mut leaves);
        leaves
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &ConfigNode)> {
        self.children.iter()
    }

    pub fn len(&self) -> usize {
        self.children.len()
    }

    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    fn collect_leaves(&self, prefix: &KeyPath, leaves: &mut Vec<(KeyPath, String)>) {
        for (name, node) in &self.children {
            let path = prefix.child(name.as_str());
            match node {
                ConfigNode::Leaf(value) => leaves.push((path, value.clone())),
                ConfigNode::Directory(tree) => tree.collect_leaves(&path, leaves),
            }
        }
    }

    fn directory_mut(&mut self, path: &[String]) -> Option<&mut ConfigTree> {
        path.iter()
            .try_fold(self, |current, segment| match current.children.get_mut(segment) {
                Some(ConfigNode::Directory(tree)) => Some(tree),
                _ => None,
            })
    }

    fn apply_to_root(&mut self, action: Action, dir: bool) {
        if action.is_removal() {
            warn!("Watched directory was removed, clearing {} entries", self.len());
            self.children.clear();
        } else if !dir {
            warn!("Ignoring {} of a value on the watched directory itself", action);
        }
    }
}
