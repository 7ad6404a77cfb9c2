use tracing::{error, info};

use odyssey_quiz::api::state::AppState;
use odyssey_quiz::config::AppConfig;
use odyssey_quiz::server;

#[tokio::main]
async fn main() -> std::io::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "odyssey_quiz=info,tower_http=info".into()),
        )
        .init();

    let config = AppConfig::from_env();
    let listener = server::bind(&config)
        .await
        .inspect_err(|e| error!(addr = %config.bind_addr(), error = %e, "failed to bind"))?;

    info!(
        addr = %listener.local_addr()?,
        "odyssey-quiz v{} listening",
        env!("CARGO_PKG_VERSION")
    );

    server::run(listener, AppState::new(config), server::shutdown_signal())
        .await
        .inspect_err(|e| error!(error = %e, "server stopped with an error"))
}
