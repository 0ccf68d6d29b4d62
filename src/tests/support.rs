//! tests/support.rs
//! Dobles de prueba: store en memoria y aleatoriedad guionada.

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::{Arc, Mutex};

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};

use crate::config::dispatcher_config::{DelayRange, DispatcherConfig};
use crate::models::campaign_model::{Campaign, CampaignStatus};
use crate::models::message_model::{CampaignMessage, MessageStatus};
use crate::services::campaign_dispatcher::{campaign_channel, CampaignDispatcher, CampaignQueue};
use crate::services::campaign_store::CampaignStore;
use crate::services::clock::{Clock, MonotonicClock};
use crate::services::random_source::RandomSource;
use crate::services::shutdown::ShutdownSignal;
use crate::services::status_simulator::StatusSimulator;

pub fn anchor() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 1, 10, 12, 0, 0).unwrap()
}

pub fn campaign_with_messages(id: &str, rate_limit: Option<i64>, count: usize) -> Campaign {
    let messages = (0..count)
        .map(|i| {
            CampaignMessage::new(
                format!("{}-m{}", id, i + 1),
                id,
                format!("+54911000000{}", i),
                "Hola!",
                anchor(),
            )
        })
        .collect();
    Campaign {
        id: id.to_string(),
        name: format!("Campaña {}", id),
        rate_limit,
        status: CampaignStatus::Running,
        created_at: anchor(),
        completed_at: None,
        messages,
    }
}

/// Store en memoria; registra cada guardado para verificar el orden.
#[derive(Default)]
pub struct MemoryStore {
    campaigns: Mutex<HashMap<String, Campaign>>,
    message_saves: Mutex<Vec<(String, MessageStatus)>>,
    campaign_saves: Mutex<Vec<String>>,
    failing_campaigns: Mutex<HashSet<String>>,
}

impl MemoryStore {
    pub fn insert(&self, campaign: Campaign) {
        self.campaigns
            .lock()
            .unwrap()
            .insert(campaign.id.clone(), campaign);
    }

    pub fn campaign(&self, id: &str) -> Campaign {
        self.campaigns.lock().unwrap()[id].clone()
    }

    pub fn message(&self, campaign_id: &str, message_id: &str) -> CampaignMessage {
        self.campaign(campaign_id)
            .messages
            .into_iter()
            .find(|m| m.id == message_id)
            .unwrap()
    }

    pub fn message_saves(&self) -> Vec<(String, MessageStatus)> {
        self.message_saves.lock().unwrap().clone()
    }

    pub fn campaign_saves(&self) -> Vec<String> {
        self.campaign_saves.lock().unwrap().clone()
    }

    /// Hace fallar todo guardado de mensajes de esa campaña.
    pub fn fail_saves_for(&self, campaign_id: &str) {
        self.failing_campaigns
            .lock()
            .unwrap()
            .insert(campaign_id.to_string());
    }
}

#[async_trait]
impl CampaignStore for MemoryStore {
    async fn load_campaign_with_messages(&self, campaign_id: &str) -> Result<Option<Campaign>> {
        Ok(self.campaigns.lock().unwrap().get(campaign_id).cloned())
    }

    async fn load_message(&self, message_id: &str) -> Result<Option<CampaignMessage>> {
        Ok(self
            .campaigns
            .lock()
            .unwrap()
            .values()
            .flat_map(|c| c.messages.iter())
            .find(|m| m.id == message_id)
            .cloned())
    }

    async fn save_message(&self, message: &CampaignMessage) -> Result<bool> {
        if self
            .failing_campaigns
            .lock()
            .unwrap()
            .contains(&message.campaign_id)
        {
            return Err(anyhow!("disk I/O error"));
        }
        let mut campaigns = self.campaigns.lock().unwrap();
        let stored = campaigns
            .get_mut(&message.campaign_id)
            .and_then(|c| c.messages.iter_mut().find(|m| m.id == message.id))
            .ok_or_else(|| anyhow!("mensaje {} no existe", message.id))?;
        if stored.status >= message.status {
            return Ok(false);
        }
        *stored = message.clone();
        self.message_saves
            .lock()
            .unwrap()
            .push((message.id.clone(), message.status));
        Ok(true)
    }

    async fn save_campaign(&self, campaign: &Campaign) -> Result<()> {
        let mut campaigns = self.campaigns.lock().unwrap();
        let stored = campaigns
            .get_mut(&campaign.id)
            .ok_or_else(|| anyhow!("campaña {} no existe", campaign.id))?;
        stored.status = campaign.status;
        stored.completed_at = campaign.completed_at;
        self.campaign_saves.lock().unwrap().push(campaign.id.clone());
        Ok(())
    }
}

/// Esperas siempre en el mínimo del rango; las tiradas salen de un guion
/// (y `false` cuando se agota).
#[derive(Default)]
pub struct ScriptedRandom {
    chances: Mutex<VecDeque<bool>>,
    probabilities: Mutex<Vec<f64>>,
}

impl ScriptedRandom {
    pub fn with_chances(chances: &[bool]) -> Self {
        Self {
            chances: Mutex::new(chances.iter().copied().collect()),
            probabilities: Mutex::new(Vec::new()),
        }
    }

    /// Probabilidades consultadas, en orden.
    pub fn asked(&self) -> Vec<f64> {
        self.probabilities.lock().unwrap().clone()
    }
}

impl RandomSource for ScriptedRandom {
    fn delay_ms(&self, range: DelayRange) -> u64 {
        range.min_ms
    }

    fn chance(&self, probability: f64) -> bool {
        self.probabilities.lock().unwrap().push(probability);
        self.chances.lock().unwrap().pop_front().unwrap_or(false)
    }
}

pub struct Harness {
    pub store: Arc<MemoryStore>,
    pub random: Arc<ScriptedRandom>,
    pub clock: Arc<MonotonicClock>,
    pub simulator: StatusSimulator,
    pub shutdown: ShutdownSignal,
    pub config: DispatcherConfig,
}

impl Harness {
    /// Debe crearse dentro del runtime (el reloj se ancla al `Instant` de tokio).
    pub fn new(chances: &[bool]) -> Self {
        let store = Arc::new(MemoryStore::default());
        let random = Arc::new(ScriptedRandom::with_chances(chances));
        let clock = Arc::new(MonotonicClock::anchored_at(anchor()));
        let simulator = StatusSimulator::new(store.clone(), clock.clone(), random.clone());
        Self {
            store,
            random,
            clock,
            simulator,
            shutdown: ShutdownSignal::new(),
            config: DispatcherConfig::default(),
        }
    }

    pub fn dispatcher(&self) -> (CampaignQueue, CampaignDispatcher) {
        let clock: Arc<dyn Clock> = self.clock.clone();
        campaign_channel(
            self.store.clone(),
            clock,
            self.simulator.clone(),
            self.config.clone(),
            self.shutdown.listener(),
        )
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }
}

/// Store SQLite sobre un archivo temporal, con migraciones aplicadas.
/// El `TempDir` debe vivir mientras se use el store.
pub async fn sqlite_store() -> (tempfile::TempDir, crate::services::campaign_store::SqliteCampaignStore) {
    use std::str::FromStr;

    use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};

    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let url = format!("sqlite:{}", dir.path().join("crm.db").display());
    let options = SqliteConnectOptions::from_str(&url)
        .expect("Invalid sqlite url")
        .create_if_missing(true);
    let pool = SqlitePoolOptions::new()
        .max_connections(2)
        .connect_with(options)
        .await
        .expect("Failed to open sqlite");

    let store = crate::services::campaign_store::SqliteCampaignStore::new(pool);
    store.run_migrations().await.expect("Migrations failed");
    (dir, store)
}

/// Tiempos mínimos para correr la simulación en tiempo real.
pub fn instant_config() -> DispatcherConfig {
    DispatcherConfig {
        default_rate_limit: 60_000,
        delivered_delay: DelayRange::fixed(2),
        read_probability: 0.0,
        read_delay: DelayRange::fixed(2),
        reply_probability: 0.0,
        reply_delay: DelayRange::fixed(2),
        ad_hoc_delivered_delay: DelayRange::fixed(2),
        ad_hoc_read_delay: DelayRange::fixed(2),
    }
}
