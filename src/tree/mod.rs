//! In-memory mirror of the watched store directory.
//!
//! Keys arrive as flat, slash delimited paths. [`KeyPath`] turns them into
//! segment sequences relative to the watched root, [`ConfigTree::from_snapshot`]
//! builds the initial tree and [`ConfigTree::apply`] keeps it in sync, one change
//! at a time.

mod builder;
mod config_tree;
mod key_path;

pub use config_tree::{ConfigNode, ConfigTree};
pub use key_path::KeyPath;
