//! Access to the hierarchical key-value store holding the configuration.
//!
//! [`EtcdClient`] talks to etcd's v2 keys API, [`Watcher`] turns its long-poll
//! notifications into a queue of [`ChangeEvent`]s.

mod etcd;
mod event;
mod key_value_store;
mod node;
mod watcher;

pub use etcd::{EtcdClient, Snapshot, StoreError, WatchEvent};
pub use event::{Action, ChangeEvent, UnknownActionError};
pub use key_value_store::KeyValueStore;
pub use node::StoreNode;
pub use watcher::Watcher;
