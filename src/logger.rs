use tracing_subscriber::filter::EnvFilter;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt};

const DEFAULT_FILTER: &str = "info";

/// Installs the global subscriber. `RUST_LOG` overrides the default level;
/// `verbose` raises this crate to debug (1) or trace (2+).
pub fn init_logging(verbose: u8) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let directive = match verbose {
            0 => DEFAULT_FILTER.to_string(),
            1 => format!("{},servicegpt_lib=debug", DEFAULT_FILTER),
            _ => format!("{},servicegpt_lib=trace", DEFAULT_FILTER),
        };
        EnvFilter::try_new(directive).unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
    });

    // a second call (tests, embedding) keeps the first subscriber
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_target(true)
                .with_writer(std::io::stderr)
                .compact(),
        )
        .try_init();
}
