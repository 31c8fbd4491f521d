use std::collections::BTreeSet;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use compio::fs;
use snafu::ResultExt;
use tracing::debug;

use crate::render::renderer::{
    CreateDirSnafu, ManifestSnafu, RemoveStaleSnafu, RenameSnafu, WriteSnafu,
};
use crate::render::RenderError;

/// Writes one file per top-level entry into the config directory.
///
/// Each file is first written to a hidden sibling and then renamed over the target, so
/// the application never picks up a half written file. Files written in an earlier round
/// whose entry is gone are removed. The names of the written files are kept in a hidden
/// manifest next to them, so files of entries removed while the daemon was down are
/// cleaned up too, while files it never wrote are left alone.
#[derive(Debug)]
pub struct ArtifactWriter {
    dir: PathBuf,
    extension: &'static str,
    written: BTreeSet<String>,
    manifest_loaded: bool,
}

impl ArtifactWriter {
    pub fn new(dir: impl Into<PathBuf>, extension: &'static str) -> Self {
        Self {
            dir: dir.into(),
            extension,
            written: BTreeSet::new(),
            manifest_loaded: false,
        }
    }

    pub fn path_for(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{}.{}", name, self.extension))
    }

    fn manifest_path(&self) -> PathBuf {
        self.dir.join(format!(".configd-{}.manifest", self.extension))
    }

    /// Replaces the files of the previous round with `files`.
    ///
    /// The manifest is updated even when the round fails halfway, so every file that made
    /// it into place is still removed once its entry disappears.
    pub async fn write_all(&mut self, files: Vec<(String, String)>) -> Result<(), RenderError> {
        fs::create_dir_all(&self.dir)
            .await
            .context(CreateDirSnafu { path: &self.dir })?;
        self.load_manifest().await?;

        let result = match self.write_files(files).await {
            Ok(current) => self.remove_stale(&current).await,
            Err(e) => Err(e),
        };
        let saved = self.save_manifest().await;
        result.and(saved)
    }

    async fn write_files(
        &mut self,
        files: Vec<(String, String)>,
    ) -> Result<BTreeSet<String>, RenderError> {
        let mut current = BTreeSet::new();
        for (name, contents) in files {
            let path = self.path_for(&name);
            let staging = self.dir.join(format!(".{}.{}.tmp", name, self.extension));
            write_and_rename(&staging, &path, contents).await?;
            debug!("Wrote {}", path.display());
            self.written.insert(name.clone());
            current.insert(name);
        }
        Ok(current)
    }

    async fn remove_stale(&mut self, current: &BTreeSet<String>) -> Result<(), RenderError> {
        let stale: Vec<String> = self.written.difference(current).cloned().collect();
        for name in stale {
            let path = self.path_for(&name);
            match fs::remove_file(&path).await {
                Ok(()) => debug!("Removed stale {}", path.display()),
                Err(e) if e.kind() == ErrorKind::NotFound => {}
                Err(e) => return Err(e).context(RemoveStaleSnafu { path }),
            }
            self.written.remove(&name);
        }
        Ok(())
    }

    async fn load_manifest(&mut self) -> Result<(), RenderError> {
        if self.manifest_loaded {
            return Ok(());
        }
        let path = self.manifest_path();
        match fs::read(&path).await {
            Ok(contents) => {
                let names = String::from_utf8_lossy(&contents);
                self.written.extend(
                    names
                        .lines()
                        .map(str::trim)
                        .filter(|name| !name.is_empty())
                        .map(str::to_string),
                );
                debug!("Loaded {} previously rendered files", self.written.len());
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => return Err(e).context(ManifestSnafu { path }),
        }
        self.manifest_loaded = true;
        Ok(())
    }

    async fn save_manifest(&self) -> Result<(), RenderError> {
        let contents: String = self.written.iter().map(|name| format!("{name}\n")).collect();
        let staging = self
            .dir
            .join(format!(".configd-{}.manifest.tmp", self.extension));
        write_and_rename(&staging, &self.manifest_path(), contents).await
    }
}

async fn write_and_rename(staging: &Path, path: &Path, contents: String) -> Result<(), RenderError> {
    fs::write(staging, contents.into_bytes())
        .await
        .0
        .context(WriteSnafu { path: staging })?;
    fs::rename(staging, path)
        .await
        .context(RenameSnafu { path })
}
