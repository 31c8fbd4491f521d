use std::fs::OpenOptions;
use std::io;
use std::panic::resume_unwind;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use compio::runtime::spawn_blocking;
use snafu::ResultExt;
use tracing::info;

use crate::reload::reloader::TouchSnafu;
use crate::reload::{ReloadError, ReloaderTrait};

/// Bumps the modification time of a file, creating it when missing.
///
/// Passenger restarts an application whenever `tmp/restart.txt` is touched.
#[derive(Debug, Clone)]
pub struct TouchReloader {
    path: PathBuf,
}

impl TouchReloader {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl ReloaderTrait for TouchReloader {
    async fn reload(&self) -> Result<(), ReloadError> {
        // compio::fs has no way to set timestamps, so the std calls run off the runtime thread.
        let path = self.path.clone();
        spawn_blocking(move || touch(&path))
            .await
            .unwrap_or_else(|panic| resume_unwind(panic))
            .context(TouchSnafu { path: &self.path })?;

        info!("Touched {}", self.path.display());
        Ok(())
    }
}

fn touch(path: &Path) -> io::Result<()> {
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)?
        .set_modified(SystemTime::now())
}
