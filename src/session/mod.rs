//! The running daemon: applies store changes to the tree and runs a render and reload
//! cycle after each of them.

mod session;
#[cfg(test)]
mod test_support;
mod watch_loop;

pub use session::{CycleError, Session};
