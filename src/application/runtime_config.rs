use std::time::Duration;

use crate::cli::Cli;
use crate::reload::ReloadOptions;
use crate::render::RenderOptions;

#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub etcd: String,
    pub etcd_dir: String,
    pub renderer: String,
    pub reloader: String,
    pub render: RenderOptions,
    pub reload: ReloadOptions,
    pub watch_timeout: Duration,
}

impl From<Cli> for RuntimeConfig {
    fn from(cli: Cli) -> Self {
        Self {
            etcd: cli.etcd,
            etcd_dir: cli.etcd_dir,
            renderer: cli.renderer,
            reloader: cli.reloader,
            render: RenderOptions {
                config_dir: cli.config_dir,
                environment: cli.env,
            },
            reload: ReloadOptions {
                touch_file: cli.touch_file,
                pid_file: cli.pid_file,
                signal: cli.signal,
                command: cli.reload_command,
            },
            watch_timeout: Duration::from_secs(cli.watch_timeout),
        }
    }
}
