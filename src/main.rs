use reminder_server::core::{AppState, Config, StoreBackend};
use reminder_server::{ReminderSweeper, create_router};
use sqlx::mysql::MySqlPoolOptions;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Logging: RUST_LOG ha la precedenza sul default
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,reminder_server=debug")),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Inizializza la configurazione
    let config = Config::from_env().map_err(|e| {
        error!("Invalid configuration: {}", e);
        e
    })?;
    config.print_info();

    let state = match (config.store_backend, &config.database_url) {
        (StoreBackend::MySql, Some(database_url)) => {
            let pool = MySqlPoolOptions::new()
                .max_connections(config.max_connections)
                .max_lifetime(Duration::from_secs(config.connection_lifetime_secs))
                .connect(database_url)
                .await?;
            info!("Connected to database");

            sqlx::migrate!("./migrations").run(&pool).await?;
            info!("Database migrations applied");

            AppState::new(pool, config.jwt_secret.clone())
        }
        (StoreBackend::MySql, None) => {
            return Err("DATABASE_URL is required for the mysql backend".into());
        }
        (StoreBackend::Memory, _) => {
            info!("Using in-memory store, data is lost on restart");
            AppState::in_memory(config.jwt_secret.clone())
        }
    };
    let state = Arc::new(state);

    // Sweeper dei promemoria in background
    let sweeper = Arc::new(ReminderSweeper::from_state(&state));
    sweeper.start(config.sweep_interval());

    let app = create_router(state);

    let addr = format!("{}:{}", config.server_host, config.server_port);
    let listener = TcpListener::bind(&addr).await?;
    info!("Server listening on http://{}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
