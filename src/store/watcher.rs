use std::io;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use futures_channel::mpsc::UnboundedSender;
use futures_channel::oneshot;
use tracing::{debug, info, warn};

use crate::store::{ChangeEvent, KeyValueStore, WatchEvent};

/// Delay before polling again after the store could not be reached
const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(1);

/// Follows the changes below a directory and forwards them into the event queue.
///
/// Runs on a dedicated thread, since every poll blocks until the store reports a change
/// or the poll times out.
pub struct Watcher<S> {
    store: S,
    key: String,
    poll_timeout: Duration,
    retry_delay: Duration,
}

impl<S> Watcher<S>
where
    S: KeyValueStore + Send + 'static,
{
    pub fn new(store: S, key: impl Into<String>, poll_timeout: Duration) -> Self {
        Self {
            store,
            key: key.into(),
            poll_timeout,
            retry_delay: DEFAULT_RETRY_DELAY,
        }
    }

    #[cfg(test)]
    pub fn with_retry_delay(mut self, retry_delay: Duration) -> Self {
        self.retry_delay = retry_delay;
        self
    }

    /// Starts watching at `start_index` until `stop` fires or the queue is closed.
    ///
    /// The sender is dropped when the thread ends, which closes the queue for the consumer.
    /// Dropping the stop sender without firing it leaves the watch running.
    pub fn spawn(
        self,
        start_index: Option<u64>,
        events: UnboundedSender<ChangeEvent>,
        stop: oneshot::Receiver<()>,
    ) -> io::Result<JoinHandle<()>> {
        thread::Builder::new()
            .name("store-watcher".to_string())
            .spawn(move || self.run(start_index, events, stop))
    }

    fn run(
        &self,
        mut wait_index: Option<u64>,
        events: UnboundedSender<ChangeEvent>,
        mut stop: oneshot::Receiver<()>,
    ) {
        debug!("Watching '{}' from index {:?}", self.key, wait_index);

        loop {
            if let Ok(Some(())) = stop.try_recv() {
                info!("Stop requested, ending watch on '{}'", self.key);
                break;
            }
            if events.is_closed() {
                debug!("Event queue closed, ending watch on '{}'", self.key);
                break;
            }

            match self
                .store
                .watch_once(&self.key, wait_index, self.poll_timeout)
            {
                Ok(WatchEvent { event, index }) => {
                    wait_index = Some(index + 1);
                    if events.unbounded_send(event).is_err() {
                        debug!("Event queue closed, ending watch on '{}'", self.key);
                        break;
                    }
                }
                Err(e) if e.is_timeout() => {}
                Err(e) => match e.resume_index() {
                    Some(index) => {
                        warn!(
                            "Skipping to index {} while watching '{}', the tree may have diverged: {}",
                            index, self.key, e
                        );
                        wait_index = Some(index);
                    }
                    None => {
                        warn!("Watch on '{}' failed, retrying: {}", self.key, e);
                        thread::sleep(self.retry_delay);
                    }
                },
            }
        }
    }
}
