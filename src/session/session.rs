use snafu::{Report, ResultExt, Snafu};
use tracing::{debug, error, info, warn};

use crate::reload::{ReloadError, Reloader, ReloaderTrait};
use crate::render::{RenderError, Renderer, RendererTrait};
use crate::store::ChangeEvent;
use crate::tree::{ConfigTree, KeyPath};

/// Everything the daemon works on: the mirrored tree plus the strategies turning it into
/// configuration files and a reloaded application.
///
/// The session is the only owner of the tree. Changes are applied one at a time, and the
/// renderer only ever sees the tree between two changes.
pub struct Session<R = Renderer, L = Reloader> {
    watched_root: String,
    tree: ConfigTree,
    renderer: R,
    reloader: L,
}

impl<R, L> Session<R, L>
where
    R: RendererTrait,
    L: ReloaderTrait,
{
    pub fn new(watched_root: impl Into<String>, tree: ConfigTree, renderer: R, reloader: L) -> Self {
        Self {
            watched_root: watched_root.into(),
            tree,
            renderer,
            reloader,
        }
    }

    #[cfg(test)]
    pub fn tree(&self) -> &ConfigTree {
        &self.tree
    }

    /// Applies a change to the tree and returns its path relative to the watched root.
    pub fn apply(&mut self, event: &ChangeEvent) -> KeyPath {
        let path = KeyPath::relative(&event.key, &self.watched_root);
        self.tree
            .apply(&path, event.action, event.value.as_deref(), event.dir);
        path
    }

    /// Renders the current tree and, if that worked, reloads the application.
    pub async fn cycle(&mut self) -> Result<(), CycleError> {
        if self.tree.is_empty() {
            warn!("Watched directory {} is empty, no configuration will be rendered", self.watched_root);
        }
        self.renderer
            .render(&self.tree)
            .await
            .context(RenderSnafu)?;
        self.reloader.reload().await.context(ReloadSnafu)?;
        Ok(())
    }

    /// Runs a cycle and logs its failure instead of returning it.
    pub async fn run_cycle(&mut self) -> bool {
        match self.cycle().await {
            Ok(()) => {
                debug!("Cycle completed");
                true
            }
            Err(e) => {
                error!("{}", Report::from_error(e));
                false
            }
        }
    }

    /// Applies a single change, logs it and runs a cycle.
    pub async fn handle(&mut self, event: ChangeEvent) {
        let path = self.apply(&event);
        let shown = if path.is_root() { "/".to_string() } else { path.to_string() };
        info!(
            "[CHANGE]: {} {} {}",
            event.action,
            shown,
            event.value.as_deref().unwrap_or_default()
        );
        self.run_cycle().await;
    }
}

#[derive(Debug, Snafu)]
pub enum CycleError {
    #[snafu(display("Rendering failed, skipping reload"))]
    RenderError { source: RenderError },
    #[snafu(display("Reloading failed"))]
    ReloadError { source: ReloadError },
}
