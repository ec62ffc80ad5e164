//! Structured logging setup.

use crate::config::{LogFormat, LoggingArgs};
use tracing::Level;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Filter used when `RUST_LOG` is not set.
fn default_filter(debug: bool) -> EnvFilter {
    let level = if debug { Level::DEBUG } else { Level::INFO };
    EnvFilter::new(level.as_str().to_lowercase())
}

/// Install the global tracing subscriber.
///
/// `RUST_LOG` wins over `--debug` when set. Calling this twice is harmless:
/// the second install fails and is ignored, which keeps tests that build
/// several services in one process quiet.
pub fn init_logging(args: &LoggingArgs) {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter(args.debug));

    let result = match args.log_format {
        LogFormat::Json => {
            let fmt_layer = tracing_subscriber::fmt::layer()
                .json()
                .with_current_span(true)
                .with_span_list(false);
            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt_layer)
                .try_init()
        }
        LogFormat::Compact => {
            let fmt_layer = tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_thread_ids(false)
                .compact();
            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt_layer)
                .try_init()
        }
    };

    if let Err(e) = result {
        eprintln!("Logging already initialized: {e}");
    }
}
