use dotenv::dotenv;
use std::env;
use std::str::FromStr;
use std::time::Duration;
use tracing::{info, warn};

const DEFAULT_JWT_SECRET: &str = "un segreto meno bello";

/// Dove vivono promemoria, utenti e chat
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    MySql,
    Memory,
}

impl FromStr for StoreBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "mysql" => Ok(StoreBackend::MySql),
            "memory" => Ok(StoreBackend::Memory),
            other => Err(format!(
                "Invalid STORE_BACKEND '{}': expected 'mysql' or 'memory'",
                other
            )),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub store_backend: StoreBackend,
    pub database_url: Option<String>,
    pub jwt_secret: String,
    pub server_host: String,
    pub server_port: u16,
    pub max_connections: u32,
    pub connection_lifetime_secs: u64,
    pub sweep_interval_secs: u64,
    pub app_env: String,
}

impl Config {
    /// Carica la configurazione dalle variabili d'ambiente
    /// Chiama dotenv() automaticamente
    pub fn from_env() -> Result<Self, String> {
        dotenv().ok();

        let store_backend = env::var("STORE_BACKEND")
            .unwrap_or_else(|_| "mysql".to_string())
            .parse::<StoreBackend>()?;

        let database_url = env::var("DATABASE_URL").ok();
        if store_backend == StoreBackend::MySql && database_url.is_none() {
            return Err("DATABASE_URL must be set in .env file when STORE_BACKEND=mysql".to_string());
        }

        let jwt_secret = env::var("JWT_SECRET").unwrap_or_else(|_| {
            warn!("JWT_SECRET not set, using default (not secure for production!)");
            DEFAULT_JWT_SECRET.to_string()
        });

        let server_host = env::var("SERVER_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());

        let server_port = env::var("SERVER_PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse::<u16>()
            .map_err(|_| "Invalid SERVER_PORT: must be a number between 0-65535".to_string())?;

        let max_connections = env::var("MAX_DB_CONNECTIONS")
            .unwrap_or_else(|_| "20".to_string())
            .parse::<u32>()
            .map_err(|_| "Invalid MAX_DB_CONNECTIONS: must be a positive number".to_string())?;

        let connection_lifetime_secs = env::var("DB_CONNECTION_LIFETIME_SECS")
            .unwrap_or_else(|_| "1800".to_string())
            .parse::<u64>()
            .map_err(|_| {
                "Invalid DB_CONNECTION_LIFETIME_SECS: must be a positive number".to_string()
            })?;

        let sweep_interval_secs = parse_sweep_interval(
            &env::var("REMINDER_SWEEP_INTERVAL_SECS").unwrap_or_else(|_| "60".to_string()),
        )?;

        let app_env = env::var("APP_ENV").unwrap_or_else(|_| "development".to_string());

        Ok(Config {
            store_backend,
            database_url,
            jwt_secret,
            server_host,
            server_port,
            max_connections,
            connection_lifetime_secs,
            sweep_interval_secs,
            app_env,
        })
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs)
    }

    /// Logga la configurazione (nascondendo i segreti)
    pub fn print_info(&self) {
        info!("Server Configuration:");
        info!("  Environment: {}", self.app_env);
        info!("  Server Address: {}:{}", self.server_host, self.server_port);
        info!("  Store backend: {:?}", self.store_backend);
        if let Some(url) = &self.database_url {
            info!("  Database: {}", Self::mask_url(url));
            info!("  Max DB Connections: {}", self.max_connections);
            info!("  Connection Lifetime: {}s", self.connection_lifetime_secs);
        }
        info!("  Reminder sweep interval: {}s", self.sweep_interval_secs);
        if self.jwt_secret == DEFAULT_JWT_SECRET {
            warn!("  JWT Secret: USING DEFAULT (INSECURE!)");
        } else {
            info!("  JWT Secret: custom secret configured");
        }
    }

    /// Maschera l'URL del database per il logging
    fn mask_url(url: &str) -> String {
        if let Some(at_pos) = url.find('@') {
            if let Some(scheme_end) = url.find("://") {
                let scheme = &url[..scheme_end + 3];
                let after_at = &url[at_pos..];
                return format!("{}***{}", scheme, after_at);
            }
        }
        "***".to_string()
    }
}

fn parse_sweep_interval(raw: &str) -> Result<u64, String> {
    match raw.parse::<u64>() {
        Ok(0) | Err(_) => Err(
            "Invalid REMINDER_SWEEP_INTERVAL_SECS: must be a positive number of seconds".to_string(),
        ),
        Ok(secs) => Ok(secs),
    }
}
