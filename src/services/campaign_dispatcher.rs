//! services/campaign_dispatcher.rs
//! Cola de campañas + worker único que las procesa en orden de llegada.

use std::sync::Arc;

use anyhow::Result;
use tokio::sync::mpsc;

use crate::{
    config::dispatcher_config::DispatcherConfig,
    services::{
        campaign_store::CampaignStore,
        clock::Clock,
        shutdown::ShutdownListener,
        status_simulator::{Progress, SimulationProfile, StatusSimulator},
    },
};

/// Lado productor de la cola. Se clona libremente entre handlers.
#[derive(Clone, Debug)]
pub struct CampaignQueue {
    sender: mpsc::UnboundedSender<String>,
}

impl CampaignQueue {
    /// Encola la campaña y retorna de inmediato. Nunca falla ni bloquea;
    /// encolar dos veces produce dos pasadas.
    pub fn enqueue(&self, campaign_id: impl Into<String>) {
        let campaign_id = campaign_id.into();
        if self.sender.send(campaign_id.clone()).is_err() {
            log::warn!(
                "(enqueue) El worker ya terminó; campaña {} descartada",
                campaign_id
            );
        }
    }
}

/// Resultado de una pasada sobre una campaña.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CampaignRunReport {
    pub campaign_id: String,
    /// Mensajes en `pending` al momento de desencolar
    pub selected: usize,
    /// Mensajes que esta pasada llevó a `sent`
    pub processed: usize,
    pub interrupted: bool,
}

pub struct CampaignDispatcher {
    receiver: mpsc::UnboundedReceiver<String>,
    store: Arc<dyn CampaignStore>,
    clock: Arc<dyn Clock>,
    simulator: StatusSimulator,
    config: DispatcherConfig,
    shutdown: ShutdownListener,
}

/// Crea la cola y su worker. El worker no arranca hasta llamar `run()`.
pub fn campaign_channel(
    store: Arc<dyn CampaignStore>,
    clock: Arc<dyn Clock>,
    simulator: StatusSimulator,
    config: DispatcherConfig,
    shutdown: ShutdownListener,
) -> (CampaignQueue, CampaignDispatcher) {
    let (sender, receiver) = mpsc::unbounded_channel();
    let dispatcher = CampaignDispatcher {
        receiver,
        store,
        clock,
        simulator,
        config,
        shutdown,
    };
    (CampaignQueue { sender }, dispatcher)
}

impl CampaignDispatcher {
    /// Loop principal: una campaña a la vez, hasta el apagado o hasta que
    /// no quede ningún `CampaignQueue` vivo.
    pub async fn run(mut self) {
        log::info!("(run) Worker de campañas iniciado");

        loop {
            let campaign_id = tokio::select! {
                biased;
                _ = self.shutdown.cancelled() => break,
                next = self.receiver.recv() => match next {
                    Some(id) => id,
                    None => break,
                },
            };

            match self.process_campaign(&campaign_id).await {
                Ok(Some(report)) => log::info!(
                    "(run) Campaña {} completada. Procesados {} de {} mensajes{}",
                    report.campaign_id,
                    report.processed,
                    report.selected,
                    if report.interrupted {
                        " (interrumpida por apagado)"
                    } else {
                        ""
                    }
                ),
                Ok(None) => log::debug!("(run) Campaña {} no existe, se ignora", campaign_id),
                Err(e) => log::error!("(run) Error procesando campaña {}: {:?}", campaign_id, e),
            }
        }

        log::info!("(run) Worker de campañas detenido");
    }

    /// Procesa una campaña completa. `Ok(None)` si el id no existe.
    ///
    /// Aunque el apagado corte la pasada, la campaña se marca `completed`
    /// con el progreso parcial que haya.
    pub async fn process_campaign(&mut self, campaign_id: &str) -> Result<Option<CampaignRunReport>> {
        let Some(mut campaign) = self.store.load_campaign_with_messages(campaign_id).await? else {
            return Ok(None);
        };

        let selected = campaign.pending_positions();
        let interval = campaign.pacing_interval(self.config.default_rate_limit);
        let profile = SimulationProfile::batch(&self.config, interval);

        log::info!(
            "(process_campaign) Campaña {}: {} mensajes pendientes, intervalo {} ms",
            campaign.id,
            selected.len(),
            interval.as_millis()
        );

        let mut processed = 0;
        let mut interrupted = false;
        for position in selected.iter().copied() {
            if self.shutdown.is_cancelled() {
                interrupted = true;
                break;
            }

            // La copia de la campaña puede estar vieja si hubo envíos individuales
            let message = &mut campaign.messages[position];
            if let Some(current) = self.store.load_message(&message.id).await? {
                *message = current;
            }
            if !message.is_pending() {
                log::debug!(
                    "(process_campaign) Mensaje {} ya en {}, se salta",
                    message.id,
                    message.status
                );
                continue;
            }

            match self
                .simulator
                .drive(message, &profile, &mut self.shutdown)
                .await?
            {
                Progress::Finished => processed += 1,
                Progress::Interrupted => {
                    processed += 1;
                    interrupted = true;
                    break;
                }
                Progress::Superseded => {}
            }
        }

        campaign.mark_completed(self.clock.now());
        self.store.save_campaign(&campaign).await?;

        Ok(Some(CampaignRunReport {
            campaign_id: campaign.id,
            selected: selected.len(),
            processed,
            interrupted,
        }))
    }
}
