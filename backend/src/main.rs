//! Hirafic Marketplace - Backend Server

use std::{sync::Arc, time::Duration};

use hirafic_backend::{
    config::{Config, StorageBackend},
    create_app,
    external::{Geocoder, LogMailer, Mailer, NominatimClient, SmtpMailer},
    store::{MemoryStore, PgStore, Store},
    AppState,
};
use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "hirafic_server=debug,hirafic_backend=debug,tower_http=debug,sqlx=warn".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    dotenvy::dotenv().ok();
    let config = Config::load()?;

    tracing::info!("Starting Hirafic Marketplace Server");
    tracing::info!("Environment: {}", config.environment);

    let store: Arc<dyn Store> = match config.database.backend {
        StorageBackend::Postgres => {
            tracing::info!("Connecting to database...");
            let db_pool = PgPoolOptions::new()
                .max_connections(config.database.max_connections)
                .min_connections(config.database.min_connections)
                .acquire_timeout(Duration::from_secs(30))
                .connect(&config.database.url)
                .await?;
            tracing::info!("Database connection established");

            tracing::info!("Running database migrations...");
            sqlx::migrate!("./migrations").run(&db_pool).await?;
            tracing::info!("Migrations completed");

            Arc::new(PgStore::new(db_pool))
        }
        StorageBackend::Memory => {
            tracing::warn!("Using in-memory storage; data is lost on restart");
            Arc::new(MemoryStore::new())
        }
    };

    let geocoder: Arc<dyn Geocoder> = Arc::new(NominatimClient::new(&config.geocoder)?);
    let mailer: Arc<dyn Mailer> = if config.mail.enabled {
        Arc::new(SmtpMailer::new(&config.mail)?)
    } else {
        tracing::info!("Mail delivery disabled; notifications will be logged");
        Arc::new(LogMailer)
    };

    // Create application state
    let state = AppState {
        store,
        geocoder,
        mailer,
        config: Arc::new(config.clone()),
    };

    // Build application
    let app = create_app(state);

    // Start server
    let addr = config.bind_address();
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
