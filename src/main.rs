#![allow(clippy::enum_variant_names)]
#![allow(clippy::module_inception)]

use clap::Parser as _;
use tracing::debug;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::fmt::SubscriberBuilder;
use tracing_subscriber::fmt::format::{Compact, DefaultFields, Format};

use crate::{
    application::{Application, ApplicationError},
    cli::Cli,
};

mod application;
mod cli;
mod reload;
mod render;
mod session;
mod store;
mod tree;

#[compio::main]
#[snafu::report]
async fn main() -> Result<(), ApplicationError> {
    let cli_args = Cli::parse();
    setup_tracing(&cli_args);
    debug!("Parsed CLI arguments: {cli_args:?}");

    Application::run(cli_args).await?;

    Ok(())
}

fn setup_tracing(cli_args: &Cli) {
    log_format(LevelFilter::from(cli_args.log_level)).init();
}

fn log_format(level: LevelFilter) -> SubscriberBuilder<DefaultFields, Format<Compact, ()>, LevelFilter> {
    tracing_subscriber::fmt()
        .with_max_level(level)
        .without_time()
        .compact()
}
