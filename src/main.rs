use std::str::FromStr;
use std::sync::Arc;

use actix_web::{web, App, HttpServer};
use anyhow::{Context, Result};
use dotenv::dotenv;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Pool, Sqlite};

use crate::config::app_config::AppConfig;
use crate::config::dispatcher_config::DispatcherConfig;
use crate::logger::init_logger;
use crate::services::campaign_dispatcher::campaign_channel;
use crate::services::campaign_store::{CampaignStore, SqliteCampaignStore};
use crate::services::clock::{Clock, MonotonicClock};
use crate::services::direct_send::DirectSendService;
use crate::services::random_source::{RandomSource, SeededRandom, ThreadRandom};
use crate::services::shutdown::ShutdownSignal;
use crate::services::status_simulator::StatusSimulator;

mod app;
mod config;
mod handlers;
mod logger;
mod models;
mod services;
#[cfg(test)]
mod tests;

fn sqlite_options(database_url: &str) -> Result<SqliteConnectOptions> {
    Ok(SqliteConnectOptions::from_str(database_url)
        .with_context(|| format!("DATABASE_URL inválida: {}", database_url))?
        .create_if_missing(true))
}

/// Crea la carpeta que contiene el archivo de SQLite, si hace falta.
fn ensure_database_dir(options: &SqliteConnectOptions) -> Result<()> {
    let filename = options.clone().get_filename();
    if let Some(dir) = filename.parent().filter(|d| !d.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("No se pudo crear directorio {}", dir.display()))?;
    }
    Ok(())
}

async fn setup_database(database_url: &str) -> Result<Pool<Sqlite>> {
    log::info!("Conectando a SQLite en {}", database_url);

    let options = sqlite_options(database_url)?;
    ensure_database_dir(&options)?;

    SqlitePoolOptions::new()
        .connect_with(options)
        .await
        .context("No se pudo conectar a la base de datos SQLite.")
}

#[actix_web::main]
async fn main() -> Result<()> {
    dotenv().ok(); // Cargar .env al inicio
    init_logger();

    let app_config = AppConfig::from_env()?;
    let dispatcher_config = DispatcherConfig::default();

    let db_pool = setup_database(&app_config.database_url).await?;
    let store = SqliteCampaignStore::new(db_pool);
    store.run_migrations().await?;

    let random: Arc<dyn RandomSource> = match app_config.dispatcher_seed {
        Some(seed) => {
            log::info!("Simulación con semilla fija {}", seed);
            Arc::new(SeededRandom::new(seed))
        }
        None => Arc::new(ThreadRandom),
    };
    let clock: Arc<dyn Clock> = Arc::new(MonotonicClock::new());
    let gateway: Arc<dyn CampaignStore> = Arc::new(store.clone());
    let simulator = StatusSimulator::new(gateway.clone(), clock.clone(), random);

    let shutdown = ShutdownSignal::new();
    let (queue, dispatcher) = campaign_channel(
        gateway.clone(),
        clock,
        simulator.clone(),
        dispatcher_config.clone(),
        shutdown.listener(),
    );
    let direct_send =
        DirectSendService::new(gateway, simulator, &dispatcher_config, shutdown.listener());

    let worker = tokio::spawn(dispatcher.run());

    log::info!(
        "Levantando servidor en {}:{}",
        app_config.host,
        app_config.port
    );
    let server = HttpServer::new(move || {
        App::new()
            .app_data(web::Data::new(store.clone()))
            .app_data(web::Data::new(queue.clone()))
            .app_data(web::Data::new(direct_send.clone()))
            .configure(app::init_app)
    })
    .bind((app_config.host.as_str(), app_config.port))?
    .run();

    let result = server.await;

    // El servidor ya paró (Ctrl+C / SIGTERM): cortar el worker y esperarlo
    shutdown.shutdown();
    if let Err(e) = worker.await {
        log::error!("El worker de campañas terminó con error: {:?}", e);
    }

    result.context("El servidor HTTP terminó con error")
}
