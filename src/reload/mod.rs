//! Telling the running application to pick up new configuration.

mod command_reloader;
mod reloader;
mod signal_reloader;
mod touch_reloader;

pub use command_reloader::CommandReloader;
pub use reloader::{ReloadError, ReloadOptions, Reloader, ReloaderCreationError, ReloaderTrait};
pub use signal_reloader::{Signal, SignalReloader, UnknownSignalError};
pub use touch_reloader::TouchReloader;
