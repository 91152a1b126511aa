use std::io::stdout;

use tracing_bunyan_formatter::{BunyanFormattingLayer, JsonStorageLayer};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use recipegen_application::infrastructure_config::{Config, LogFormat};

const SERVICE_NAME: &str = "recipegen-backend";

/// Installs the global subscriber. Bunyan JSON for log shippers, a
/// compact human-readable format for local runs. `RUST_LOG` wins over
/// the configured level when set.
pub fn init_tracing(config: &Config) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    match config.logging.format {
        LogFormat::Json => {
            tracing_subscriber::registry()
                .with(filter)
                .with(JsonStorageLayer)
                .with(BunyanFormattingLayer::new(SERVICE_NAME.to_string(), stdout))
                .init();
        }
        LogFormat::Pretty => {
            tracing_subscriber::fmt()
                .compact()
                .with_target(true)
                .with_file(config.logging.include_location)
                .with_line_number(config.logging.include_location)
                .with_env_filter(filter)
                .init();
        }
    }
}
