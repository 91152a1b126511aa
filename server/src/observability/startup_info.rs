use recipegen_application::infrastructure_config::{
    Config, CreditStoreBackend, ProvidersConfig,
};
use tracing::info;

pub fn print_api_info(config: &Config) {
    print_api_documentation_info(config);
    print_configuration_info(config);
}

fn print_api_documentation_info(config: &Config) {
    let base_url = format!("http://{}", config.server_address());
    info!("📋 API Documentation:");
    info!("  📖 Swagger UI: {}/docs", base_url);
    info!("  📄 OpenAPI JSON: {}/api-docs/openapi.json", base_url);
}

fn print_configuration_info(config: &Config) {
    info!("⚙️  Configuration:");
    print_credit_configuration(config);
    print_provider_configuration(&config.providers);
    info!("  🍳 Content generator: {}", config.content.base_url);
}

fn print_credit_configuration(config: &Config) {
    let backend = match config.credits.store_backend {
        CreditStoreBackend::Memory => "in-memory (non-durable)",
        CreditStoreBackend::Postgres => "PostgreSQL",
    };
    info!(
        "  💳 Credits: {} store, {} initial grant, {} per generation",
        backend, config.credits.initial_grant, config.credits.generation_cost
    );
}

fn print_provider_configuration(providers: &ProvidersConfig) {
    info!(
        "  🖼️  Dashscope: {} ({})",
        if providers.dashscope.is_configured() {
            "ENABLED"
        } else {
            "disabled"
        },
        providers.dashscope.model
    );
    info!(
        "  🖼️  Replicate: {} ({})",
        if providers.replicate.is_configured() {
            "ENABLED"
        } else {
            "disabled"
        },
        providers.replicate.model_version
    );
    info!(
        "  ⏱️  Poll window: {}s, provider timeout {}s",
        providers.poll_timeout_secs, providers.request_timeout_secs
    );
}
