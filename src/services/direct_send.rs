//! services/direct_send.rs
//! Envío individual de un mensaje, fuera de la cola de campañas.

use std::sync::Arc;

use anyhow::Result;

use crate::{
    config::dispatcher_config::DispatcherConfig,
    models::message_model::CampaignMessage,
    services::{
        campaign_store::CampaignStore,
        shutdown::ShutdownListener,
        status_simulator::{SimulationProfile, StatusSimulator},
    },
};

#[derive(Clone)]
pub struct DirectSendService {
    store: Arc<dyn CampaignStore>,
    simulator: StatusSimulator,
    profile: SimulationProfile,
    shutdown: ShutdownListener,
}

impl DirectSendService {
    pub fn new(
        store: Arc<dyn CampaignStore>,
        simulator: StatusSimulator,
        config: &DispatcherConfig,
        shutdown: ShutdownListener,
    ) -> Self {
        Self {
            store,
            simulator,
            profile: SimulationProfile::ad_hoc(config),
            shutdown,
        }
    }

    /// Marca el mensaje `sent` ya mismo y deja el resto de la progresión en
    /// segundo plano. Devuelve el mensaje tal como quedó persistido, o `None`
    /// si no existe. Un mensaje que no está en `pending` se devuelve sin tocar.
    pub async fn send_message(&self, message_id: &str) -> Result<Option<CampaignMessage>> {
        let Some(mut message) = self.store.load_message(message_id).await? else {
            return Ok(None);
        };

        if !message.is_pending() {
            log::info!(
                "(send_message) Mensaje {} ya está en {}, no se reenvía",
                message.id,
                message.status
            );
            return Ok(Some(message));
        }

        if !self.simulator.mark_sent(&mut message).await? {
            // Lo ganó otro escritor (la campaña en curso); queda recargado
            return Ok(Some(message));
        }
        let snapshot = message.clone();

        let simulator = self.simulator.clone();
        let profile = self.profile.clone();
        let mut shutdown = self.shutdown.clone();
        tokio::spawn(async move {
            match simulator.drive(&mut message, &profile, &mut shutdown).await {
                Ok(progress) => log::debug!(
                    "(send_message) Mensaje {} terminó en {} ({:?})",
                    message.id,
                    message.status,
                    progress
                ),
                Err(e) => log::error!(
                    "(send_message) Error simulando mensaje {}: {:?}",
                    message.id,
                    e
                ),
            }
        });

        Ok(Some(snapshot))
    }
}
