//! Linecall server binary.

use linecall_server::{LinecallServer, ServerConfig, ServerError};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), ServerError> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "linecall=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = ServerConfig::from_env()?;
    tracing::info!(
        environment = %config.environment,
        ws = %config.ws_addr,
        http = %config.http_addr,
        grid_size = config.rules.grid_size,
        turn_seconds = config.rules.turn_seconds,
        "starting linecall server"
    );

    let server = LinecallServer::bind(config).await?;
    server.run().await
}
