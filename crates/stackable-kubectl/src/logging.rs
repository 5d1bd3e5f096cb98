//! Installation of the global `tracing` subscriber for binaries built on this
//! crate. Library code only emits events.
use snafu::{ResultExt, Snafu};
use tracing::level_filters::LevelFilter;
use tracing_subscriber::{
    EnvFilter, Registry, layer::SubscriberExt, util::SubscriberInitExt as _,
};

#[derive(Debug, Snafu)]
pub enum Error {
    #[snafu(display("failed to install global tracing subscriber"))]
    InstallSubscriber {
        source: tracing_subscriber::util::TryInitError,
    },
}

/// Initializes `tracing` logging with the filter directives read from the
/// environment variable `env`, for example `KUBECTL_LOG=debug`.
///
/// If the variable is unset or invalid, the maximum log level is INFO.
/// Returns an error if a global subscriber is already installed.
pub fn initialize_logging(env: &str) -> Result<(), Error> {
    let filter = EnvFilter::builder()
        .with_env_var(env)
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy();

    Registry::default()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .try_init()
        .context(InstallSubscriberSnafu)
}
