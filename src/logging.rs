//! Tracing subscriber setup for the binary.

use tracing::level_filters::LevelFilter;
use tracing_subscriber::fmt::layer;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::{SubscriberInitExt, TryInitError};
use tracing_subscriber::{EnvFilter, Layer};

/// Map `-v` repetitions to a level: 0 → warn, 1 → info, 2 → debug, 3+ → trace.
pub fn level_for(verbosity: u8) -> LevelFilter {
    match verbosity {
        0 => LevelFilter::WARN,
        1 => LevelFilter::INFO,
        2 => LevelFilter::DEBUG,
        _ => LevelFilter::TRACE,
    }
}

/// Install the global subscriber, writing to stderr. `RUST_LOG` directives
/// take precedence over `level`. Fails if a subscriber is already installed.
pub fn init(level: LevelFilter, json: bool) -> Result<(), TryInitError> {
    let filter = EnvFilter::builder()
        .with_default_directive(level.into())
        .from_env_lossy();

    let layer = if json {
        layer().json().with_writer(std::io::stderr).boxed()
    } else {
        layer().with_target(false).with_writer(std::io::stderr).boxed()
    };

    tracing_subscriber::registry().with(layer.with_filter(filter)).try_init()
}
