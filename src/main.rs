use clap::Parser;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use tokengate::{
    Authenticator, Config,
    handlers::{AppState, create_router},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::parse();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| config.log_level.clone().into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let tenant = config.tenant_config()?;
    let jwks_url = tenant.jwks_url()?;
    let auth = Arc::new(Authenticator::new(tenant)?);

    let app = create_router(AppState { auth });

    let app = if config.cors {
        app.layer(CorsLayer::permissive())
    } else {
        app
    };

    let addr = config.bind_addr();
    tracing::info!("Starting tokengate on {}", addr);
    tracing::info!("Key set: {}", jwks_url);
    match config.jwks_cache_ttl_secs {
        Some(ttl) => tracing::info!("Key set cached for {}s", ttl),
        None => tracing::info!("Key set refetched on every request"),
    }

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
