//! Tresorerie API server.
//!
//! Wires configuration, the database pool, file custody, token signing,
//! the event hub, and the fiscal calendar into the router and serves it.

use std::sync::Arc;

use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use tresorerie_api::{create_router, AppState};
use tresorerie_core::events::EventHub;
use tresorerie_core::fiscal::FiscalYearResolver;
use tresorerie_core::storage::FileStore;
use tresorerie_db::connect;
use tresorerie_shared::config::JwtConfig;
use tresorerie_shared::{AppConfig, JwtService};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tresorerie=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::load()?;

    let db = connect(
        &config.database.url,
        config.database.max_connections,
        config.database.min_connections,
    )
    .await?;
    info!("connected to database");

    let files = FileStore::new_fs(&config.storage.root)?;
    info!(root = %config.storage.root, "file store ready");

    let fiscal = FiscalYearResolver::from_name(&config.fiscal.timezone)?;
    info!(
        timezone = %config.fiscal.timezone,
        fiscal_year = fiscal.current(),
        "fiscal calendar resolved"
    );

    let jwt = Arc::new(JwtService::new(JwtConfig {
        secret: config.jwt.secret.clone(),
        token_expiry_minutes: config.jwt.token_expiry_minutes,
    }));

    let state = AppState {
        db,
        jwt,
        files,
        events: Arc::new(EventHub::default()),
        fiscal,
    };
    let app = create_router(state);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = TcpListener::bind(&addr).await?;
    info!("server listening on {addr}");

    axum::serve(listener, app).await?;
    Ok(())
}
