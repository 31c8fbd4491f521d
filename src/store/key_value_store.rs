use std::time::Duration;

use crate::store::{Snapshot, StoreError, WatchEvent};

/// The two operations the daemon needs from a hierarchical key-value store.
pub trait KeyValueStore {
    /// Fetches a recursive listing of the directory at `key`.
    fn snapshot(&self, key: &str) -> Result<Snapshot, StoreError>;

    /// Blocks until the next change below `key` at or after `wait_index`, or until `timeout`.
    fn watch_once(
        &self,
        key: &str,
        wait_index: Option<u64>,
        timeout: Duration,
    ) -> Result<WatchEvent, StoreError>;
}
