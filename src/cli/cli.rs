use std::path::PathBuf;

use clap::Parser;

use crate::cli::LogLevel;

/// Watches a directory in etcd, renders it into configuration files and reloads the
/// application whenever something below it changes.
#[derive(Parser, Debug, Clone)]
#[command(version, about)]
pub struct Cli {
    /// etcd address location, several endpoints may be separated by commas
    #[clap(long, default_value = "http://localhost:4001")]
    pub etcd: String,

    /// etcd directory that contains the configurations
    #[clap(long, default_value = "/rails/production")]
    pub etcd_dir: String,

    /// The environment to configure
    #[clap(long, default_value = "production")]
    pub env: String,

    /// The renderer to use when outputting the configs (yaml, json)
    #[clap(long, default_value = "yaml")]
    pub renderer: String,

    /// The strategy to reload the application (touch, signal, command)
    #[clap(long, default_value = "touch")]
    pub reloader: String,

    /// Directory the rendered configuration files are written to
    #[clap(long, default_value = "config")]
    pub config_dir: PathBuf,

    /// File touched by the touch reloader
    #[clap(long, default_value = "tmp/restart.txt")]
    pub touch_file: PathBuf,

    /// Pid file of the process signalled by the signal reloader
    #[clap(long, default_value = "tmp/pids/server.pid")]
    pub pid_file: PathBuf,

    /// Signal sent by the signal reloader
    #[clap(long, default_value = "HUP")]
    pub signal: String,

    /// Shell command run by the command reloader
    #[clap(long)]
    pub reload_command: Option<String>,

    /// Seconds a single watch request waits for a change before polling again
    #[clap(long, default_value_t = 30)]
    pub watch_timeout: u64,

    #[clap(long, short, default_value = "info", value_enum)]
    pub log_level: LogLevel,
}
