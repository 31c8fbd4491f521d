use std::time::Duration;

use compio::runtime::spawn;
use futures_channel::mpsc::{self, UnboundedSender};
use futures_channel::oneshot;
use snafu::prelude::*;
use tracing::{debug, error, info};

use crate::application::RuntimeConfig;
use crate::reload::{Reloader, ReloaderCreationError};
use crate::render::{Renderer, UnknownRendererError};
use crate::session::Session;
use crate::store::{ChangeEvent, EtcdClient, KeyValueStore, StoreError, Watcher};
use crate::tree::ConfigTree;

/// Timeout of the non-watch requests made to etcd
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

pub struct Application;

impl Application {
    pub async fn run(config: impl Into<RuntimeConfig>) -> Result<(), ApplicationError> {
        let config: RuntimeConfig = config.into();
        debug!("Runtime config: {:?}", config);

        let renderer = Renderer::open(&config.renderer, &config.render).context(RendererSnafu)?;
        let reloader = Reloader::open(&config.reloader, &config.reload).context(ReloaderSnafu)?;

        let mut client = EtcdClient::new(&config.etcd, REQUEST_TIMEOUT).context(StoreClientSnafu)?;
        client.sync_cluster().context(ClusterSyncSnafu)?;
        info!("Using etcd machines {}", client.endpoints().join(", "));

        let snapshot = client.snapshot(&config.etcd_dir).context(SnapshotSnafu {
            dir: &config.etcd_dir,
        })?;
        ensure!(
            snapshot.node.dir,
            NotADirectorySnafu {
                dir: &config.etcd_dir
            }
        );

        let tree = ConfigTree::from_snapshot(&snapshot.node, &config.etcd_dir);
        let mut session = Session::new(&config.etcd_dir, tree, renderer, reloader);
        session.run_cycle().await;

        let (sender, receiver) = mpsc::unbounded();
        let (stop_sender, stop_receiver) = oneshot::channel();
        Watcher::new(client, &config.etcd_dir, config.watch_timeout)
            .spawn(
                snapshot.index.map(|index| index + 1),
                sender.clone(),
                stop_receiver,
            )
            .context(WatcherSpawnSnafu)?;
        spawn(wait_for_interrupt(sender, stop_sender)).detach();

        info!("Waiting for changes from etcd @ {}", config.etcd_dir);
        session.watch(receiver).await;

        Ok(())
    }
}

/// Stops the watcher on the first interrupt and closes the queue so the watch loop ends
/// once the change in progress is done.
async fn wait_for_interrupt(events: UnboundedSender<ChangeEvent>, stop: oneshot::Sender<()>) {
    match compio::signal::ctrl_c().await {
        Ok(()) => {
            info!("Interrupt received, finishing");
            let _ = stop.send(());
            events.close_channel();
        }
        Err(e) => error!("Failed to listen for interrupts: {}", e),
    }
}

#[derive(Debug, Snafu)]
pub enum ApplicationError {
    #[snafu(display("Invalid renderer"))]
    RendererError { source: UnknownRendererError },
    #[snafu(display("Invalid reloader"))]
    ReloaderError { source: ReloaderCreationError },
    #[snafu(display("Failed to set up the etcd client, please check --etcd"))]
    StoreClientError { source: StoreError },
    #[snafu(display("Cannot sync with etcd machines, please check --etcd"))]
    ClusterSyncError { source: StoreError },
    #[snafu(display("Failed to fetch the configuration below {}", dir))]
    SnapshotError { dir: String, source: StoreError },
    #[snafu(display("etcd-dir {} should be a directory", dir))]
    NotADirectory { dir: String },
    #[snafu(display("Failed to start the etcd watcher"))]
    WatcherSpawnError { source: std::io::Error },
}
