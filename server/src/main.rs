use std::error::Error;
use std::future;
use std::net::SocketAddr;
use std::process::ExitCode;

use tokio::net::TcpListener;
use tokio::signal;
use tracing::{error, info};

use server::bootstrap::router::create_router;
use server::bootstrap::state::AppState;
use server::config_loader;
use server::observability;

#[tokio::main]
async fn main() -> ExitCode {
    if let Err(err) = run().await {
        eprintln!("recipegen-backend failed: {err}");
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}

async fn run() -> Result<(), Box<dyn Error>> {
    dotenvy::dotenv().ok();

    let config = config_loader::load_config()?;
    observability::tracing::init_tracing(&config);

    info!("Booting recipegen-backend");
    info!("Database: {}", config.db.redacted_url());

    let state = AppState::new(config.clone()).await?;
    let router = create_router(state)?;

    let addr = config.server_address();
    let listener = TcpListener::bind(&addr).await?;
    info!("Listening on http://{addr}");
    observability::startup_info::print_api_info(&config);

    axum::serve(
        listener,
        router.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(wait_for_shutdown())
    .await?;

    info!("Shutdown complete");
    Ok(())
}

async fn wait_for_shutdown() {
    let sigterm = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(err) => {
                error!("SIGTERM handler unavailable: {err}");
                future::pending::<()>().await;
            }
        }
    };

    tokio::select! {
        result = signal::ctrl_c() => {
            if let Err(err) = result {
                error!("Ctrl+C handler unavailable: {err}");
            }
        }
        () = sigterm => {}
    }

    info!("Shutdown signal received, draining connections");
}
