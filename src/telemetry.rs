//! telemetry
//!
//! Logging setup for the binary.
//!
//! Events go to stderr so that stdout stays reserved for command output
//! (the JSON form of a result in particular). The filter is read from
//! `PROPOSER_LOG` using `EnvFilter` directive syntax; without it the level
//! follows the global flags.

use tracing::level_filters::LevelFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Registry};

/// Environment variable holding filter directives.
pub const LOG_ENV: &str = "PROPOSER_LOG";

/// Default level for the given global flags. `debug` wins over `quiet`.
pub fn default_level(debug: bool, quiet: bool) -> LevelFilter {
    if debug {
        LevelFilter::DEBUG
    } else if quiet {
        LevelFilter::WARN
    } else {
        LevelFilter::INFO
    }
}

/// Install the global subscriber.
///
/// Calling this more than once is harmless; later calls are ignored.
pub fn init(debug: bool, quiet: bool) {
    let filter = EnvFilter::builder()
        .with_default_directive(default_level(debug, quiet).into())
        .with_env_var(LOG_ENV)
        .from_env_lossy();

    let layer = tracing_subscriber::fmt::layer()
        .compact()
        .with_writer(std::io::stderr)
        .with_target(debug);

    let _ = Registry::default().with(filter).with(layer).try_init();
}
