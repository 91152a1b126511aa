#[cfg(any(
    feature = "adapters",
    feature = "axum",
    feature = "sqlx",
    feature = "reqwest"
))]
compile_error!("application must not depend on adapters/framework crates");

pub mod config;
pub mod credits;
pub mod error;
pub mod generation;
pub mod infrastructure_config;
pub mod ports;

#[cfg(test)]
pub(crate) mod test_support;
