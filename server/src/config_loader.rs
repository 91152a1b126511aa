use std::fs;
use std::path::Path;

use figment::{
    Figment,
    providers::{Env, Format, Json, Serialized, Toml},
};
use tracing::warn;

use recipegen_application::error::{AppError, AppResult};
use recipegen_application::infrastructure_config::Config;

const TOML_FILE: &str = "config.toml";
const JSON_FILE: &str = "config.json";
const ENV_PREFIX: &str = "RECIPEGEN_";

/// Layered configuration: compiled-in defaults, then `config.toml`,
/// then `config.json`, then `RECIPEGEN_`-prefixed environment
/// variables with `__` separating nesting levels
/// (e.g. `RECIPEGEN_CREDITS__INITIAL_GRANT=5`).
pub fn load_config() -> AppResult<Config> {
    seed_env_file()?;

    let mut layers = Figment::from(Serialized::defaults(Config::default()));
    if Path::new(TOML_FILE).is_file() {
        layers = layers.merge(Toml::file(TOML_FILE));
    }
    if Path::new(JSON_FILE).is_file() {
        layers = layers.merge(Json::file(JSON_FILE));
    }

    let config: Config = layers
        .merge(Env::prefixed(ENV_PREFIX).split("__"))
        .extract()
        .map_err(|e| AppError::ConfigError {
            message: format!("Configuration is invalid: {e}"),
        })?;

    config.validate()?;
    Ok(config)
}

// First-run convenience: copy .env.example to .env so provider
// credentials have an obvious, gitignored home.
fn seed_env_file() -> AppResult<()> {
    if Path::new(".env").is_file() || !Path::new(".env.example").is_file() {
        return Ok(());
    }

    fs::copy(".env.example", ".env").map_err(|e| AppError::ConfigError {
        message: format!("Could not seed .env from .env.example: {e}"),
    })?;

    warn!("Created .env from .env.example; add provider credentials before enabling image generation");
    Ok(())
}
