use std::process::ExitCode;
use std::sync::Arc;

use tracing::{error, info};

use swap_client::api::{ApiClient, RemoteApi};
use swap_client::config::AppConfig;
use swap_client::store::Store;
use swap_client::web::{AppState, create_router};

/// Initialize tracing (logging) from the application config.
///
/// `RUST_LOG` wins over `SWAP_LOG` when both are set.
fn init_tracing(config: &AppConfig) {
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.log_level));

    match config.log_format.as_str() {
        "json" => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer())
                .init();
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let config = match AppConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Invalid configuration: {e}");
            return ExitCode::FAILURE;
        }
    };
    init_tracing(&config);

    let client = match ApiClient::new(config.api_config()) {
        Ok(client) => client,
        Err(e) => {
            error!(error = %e, "failed to create API client");
            return ExitCode::FAILURE;
        }
    };
    let api = Arc::new(RemoteApi::new(client, &config.payment_gateway));
    let store = Arc::new(Store::open(&config.store_path));

    let state = AppState::new(api, store, &config);
    let app = create_router(state, &config.static_dir);

    let listener = match tokio::net::TcpListener::bind(config.listen_addr).await {
        Ok(listener) => listener,
        Err(e) => {
            error!(addr = %config.listen_addr, error = %e, "failed to bind");
            return ExitCode::FAILURE;
        }
    };

    info!(
        addr = %config.listen_addr,
        api = %config.api_base_url,
        gateway = %config.payment_gateway,
        store = %config.store_path.display(),
        "battery swap front-end listening"
    );
    info!("open http://{}/stations in your browser", config.listen_addr);

    if let Err(e) = axum::serve(listener, app).await {
        error!(error = %e, "server stopped");
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}
