use std::net::SocketAddr;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use shutterbox::{config::Config, router, state::AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let prod = std::env::args().skip(1).any(|arg| arg == "--prod")
        || std::env::var("APP_ENV").is_ok_and(|env| env == "production");

    let config = Config::load(prod)?;
    tracing::info!("✅ Configuration loaded successfully ({})", config.env);
    if !config.is_prod() {
        tracing::warn!("⚠️ Running in development mode, cookies are not marked Secure");
    }

    let port = config.port;
    let state = AppState::new(config).await?;
    tracing::info!("✅ AppState initialized");

    let app = router::build(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("🚀 Server listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
