use std::path::PathBuf;
use std::str::FromStr;

use compio::fs;
use derive_more::Display;
use snafu::prelude::*;
use tracing::info;

use crate::reload::reloader::{InvalidPidSnafu, ReadPidSnafu};
use crate::reload::{ReloadError, ReloaderTrait};

/// Signals the application's master process, whose pid is read from a pid file on every reload.
#[derive(Debug, Clone)]
pub struct SignalReloader {
    pid_file: PathBuf,
    signal: Signal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum Signal {
    #[display("SIGHUP")]
    Hup,
    #[display("SIGINT")]
    Int,
    #[display("SIGQUIT")]
    Quit,
    #[display("SIGTERM")]
    Term,
    #[display("SIGUSR1")]
    Usr1,
    #[display("SIGUSR2")]
    Usr2,
}

impl FromStr for Signal {
    type Err = UnknownSignalError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let upper = raw.trim().to_ascii_uppercase();
        match upper.strip_prefix("SIG").unwrap_or(&upper) {
            "HUP" => Ok(Signal::Hup),
            "INT" => Ok(Signal::Int),
            "QUIT" => Ok(Signal::Quit),
            "TERM" => Ok(Signal::Term),
            "USR1" => Ok(Signal::Usr1),
            "USR2" => Ok(Signal::Usr2),
            _ => UnknownSignalSnafu { name: raw }.fail(),
        }
    }
}

#[derive(Debug, Snafu)]
#[snafu(display("Unknown signal '{}', expected one of HUP, INT, QUIT, TERM, USR1, USR2", name))]
pub struct UnknownSignalError {
    name: String,
}

impl SignalReloader {
    pub fn new(pid_file: impl Into<PathBuf>, signal: Signal) -> Self {
        Self {
            pid_file: pid_file.into(),
            signal,
        }
    }

    async fn read_pid(&self) -> Result<i32, ReloadError> {
        let bytes = fs::read(&self.pid_file).await.context(ReadPidSnafu {
            path: &self.pid_file,
        })?;
        let contents = String::from_utf8_lossy(&bytes);
        contents.trim().parse().ok().context(InvalidPidSnafu {
            path: &self.pid_file,
            contents: contents.trim(),
        })
    }
}

impl ReloaderTrait for SignalReloader {
    async fn reload(&self) -> Result<(), ReloadError> {
        let pid = self.read_pid().await?;
        send_signal(pid, self.signal)?;
        info!("Sent {} to process {}", self.signal, pid);
        Ok(())
    }
}

#[cfg(unix)]
fn send_signal(pid: i32, signal: Signal) -> Result<(), ReloadError> {
    use crate::reload::reloader::SendSignalSnafu;

    let number = match signal {
        Signal::Hup => libc::SIGHUP,
        Signal::Int => libc::SIGINT,
        Signal::Quit => libc::SIGQUIT,
        Signal::Term => libc::SIGTERM,
        Signal::Usr1 => libc::SIGUSR1,
        Signal::Usr2 => libc::SIGUSR2,
    };
    // SAFETY: kill has no memory safety preconditions
    if unsafe { libc::kill(pid, number) } == -1 {
        return Err(std::io::Error::last_os_error()).context(SendSignalSnafu { pid, signal });
    }
    Ok(())
}

#[cfg(not(unix))]
fn send_signal(_pid: i32, _signal: Signal) -> Result<(), ReloadError> {
    crate::reload::reloader::UnsupportedPlatformSnafu.fail()
}
