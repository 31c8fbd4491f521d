use std::path::PathBuf;

use snafu::prelude::*;

use crate::reload::{CommandReloader, Signal, SignalReloader, TouchReloader, UnknownSignalError};

pub const RELOADER_NAMES: [&str; 3] = ["touch", "signal", "command"];

#[derive(Debug, Clone)]
pub struct ReloadOptions {
    /// File whose modification time is bumped by the `touch` reloader
    pub touch_file: PathBuf,
    /// File holding the PID signalled by the `signal` reloader
    pub pid_file: PathBuf,
    pub signal: String,
    /// Shell command run by the `command` reloader
    pub command: Option<String>,
}

pub trait ReloaderTrait {
    /// Tells the consuming application to pick up the freshly rendered configuration
    async fn reload(&self) -> Result<(), ReloadError>;
}

#[derive(Debug, Clone)]
pub enum Reloader {
    Touch(TouchReloader),
    Signal(SignalReloader),
    Command(CommandReloader),
}

impl Reloader {
    /// Looks up a reloader by name and validates the options it needs
    pub fn open(name: &str, options: &ReloadOptions) -> Result<Self, ReloaderCreationError> {
        match name {
            "touch" => Ok(Reloader::Touch(TouchReloader::new(&options.touch_file))),
            "signal" => {
                let signal: Signal = options.signal.parse().context(SignalSnafu)?;
                Ok(Reloader::Signal(SignalReloader::new(
                    &options.pid_file,
                    signal,
                )))
            }
            "command" => {
                let command = options.command.clone().context(MissingCommandSnafu)?;
                Ok(Reloader::Command(CommandReloader::new(command)))
            }
            _ => UnknownReloaderSnafu {
                name,
                known: RELOADER_NAMES.join(", "),
            }
            .fail(),
        }
    }
}

impl ReloaderTrait for Reloader {
    async fn reload(&self) -> Result<(), ReloadError> {
        match self {
            Reloader::Touch(reloader) => reloader.reload().await,
            Reloader::Signal(reloader) => reloader.reload().await,
            Reloader::Command(reloader) => reloader.reload().await,
        }
    }
}

#[derive(Debug, Snafu)]
pub enum ReloaderCreationError {
    #[snafu(display("Unknown reloader '{}', available reloaders: {}", name, known))]
    UnknownReloader { name: String, known: String },
    #[snafu(display("Invalid signal for the signal reloader"))]
    SignalError { source: UnknownSignalError },
    #[snafu(display("The command reloader needs --reload-command"))]
    MissingCommand,
}

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum ReloadError {
    #[snafu(display("Failed to touch {}", path.display()))]
    TouchError {
        path: PathBuf,
        source: std::io::Error,
    },
    #[snafu(display("Failed to read pid file {}", path.display()))]
    ReadPidError {
        path: PathBuf,
        source: std::io::Error,
    },
    #[snafu(display("Pid file {} does not hold a pid: '{}'", path.display(), contents))]
    InvalidPid { path: PathBuf, contents: String },
    #[snafu(display("Failed to send {} to process {}", signal, pid))]
    SendSignalError {
        pid: i32,
        signal: Signal,
        source: std::io::Error,
    },
    #[snafu(display("Sending signals is not supported on this platform"))]
    UnsupportedPlatform,
    #[snafu(display("Failed to spawn reload command '{}'", command))]
    SpawnError {
        command: String,
        source: std::io::Error,
    },
    #[snafu(display("Failed to wait for reload command '{}'", command))]
    WaitError {
        command: String,
        source: std::io::Error,
    },
    #[snafu(display("Reload command '{}' failed with exit code {}", command, status))]
    UnsuccessfulCommand { command: String, status: i32 },
}
