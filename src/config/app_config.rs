//! config/app_config.rs
//! Variables de entorno de la app (se cargan después de `dotenv()`).

use std::env;

use anyhow::{Context, Result};

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    /// Semilla opcional para reproducir la simulación
    pub dispatcher_seed: Option<u64>,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        let database_url =
            env::var("DATABASE_URL").unwrap_or_else(|_| "sqlite:data/crm.db".to_string());
        let host = env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        let port = match env::var("PORT") {
            Ok(raw) => raw
                .parse()
                .with_context(|| format!("PORT inválido: {}", raw))?,
            Err(_) => 8080,
        };
        let dispatcher_seed = match env::var("DISPATCHER_SEED") {
            Ok(raw) => Some(
                raw.parse()
                    .with_context(|| format!("DISPATCHER_SEED inválido: {}", raw))?,
            ),
            Err(_) => None,
        };

        Ok(AppConfig {
            database_url,
            host,
            port,
            dispatcher_seed,
        })
    }
}
