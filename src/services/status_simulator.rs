//! services/status_simulator.rs
//! Máquina de estados simulada de un mensaje saliente:
//! pending -> sent -> delivered -> [read] -> [replied].
//!
//! La usan tanto el despachador de campañas (con ritmo) como el envío
//! individual; solo cambia el `SimulationProfile`.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{ensure, Result};

use crate::{
    config::dispatcher_config::{DelayRange, DispatcherConfig},
    models::message_model::{CampaignMessage, MessageStatus},
    services::{
        campaign_store::CampaignStore, clock::Clock, random_source::RandomSource,
        shutdown::ShutdownListener,
    },
};

/// Rama opcional de la progresión (read / replied).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Branch {
    pub probability: f64,
    pub delay: DelayRange,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SimulationProfile {
    pub delivered_delay: DelayRange,
    pub read: Branch,
    /// Independiente de `read`: un mensaje puede quedar `replied` sin pasar por `read`.
    pub reply: Branch,
    /// Espera después del mensaje (incluido el último). `None` = sin ritmo.
    pub pacing: Option<Duration>,
}

impl SimulationProfile {
    /// Perfil de campaña: tiempos aleatorios y pausa `interval` entre mensajes.
    pub fn batch(config: &DispatcherConfig, interval: Duration) -> Self {
        Self {
            delivered_delay: config.delivered_delay,
            read: Branch {
                probability: config.read_probability,
                delay: config.read_delay,
            },
            reply: Branch {
                probability: config.reply_probability,
                delay: config.reply_delay,
            },
            pacing: Some(interval),
        }
    }

    /// Perfil de envío individual: entregado y leído siempre, sin respuesta ni ritmo.
    pub fn ad_hoc(config: &DispatcherConfig) -> Self {
        Self {
            delivered_delay: config.ad_hoc_delivered_delay,
            read: Branch {
                probability: 1.0,
                delay: config.ad_hoc_read_delay,
            },
            reply: Branch {
                probability: 0.0,
                delay: DelayRange::fixed(0),
            },
            pacing: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Progress {
    /// Recorrió toda la progresión que le tocaba (y la pausa, si había).
    Finished,
    /// El apagado cortó una espera; el mensaje queda en su último estado.
    Interrupted,
    /// Otro escritor (p. ej. un envío individual) ya había avanzado el mensaje;
    /// no se tocó nada más.
    Superseded,
}

#[derive(Clone)]
pub struct StatusSimulator {
    store: Arc<dyn CampaignStore>,
    clock: Arc<dyn Clock>,
    random: Arc<dyn RandomSource>,
}

impl StatusSimulator {
    pub fn new(
        store: Arc<dyn CampaignStore>,
        clock: Arc<dyn Clock>,
        random: Arc<dyn RandomSource>,
    ) -> Self {
        Self {
            store,
            clock,
            random,
        }
    }

    /// Marca `sent` y persiste. Sirve para el paso síncrono del envío individual.
    /// `false` si el mensaje ya no estaba en `pending` en el store.
    pub async fn mark_sent(&self, message: &mut CampaignMessage) -> Result<bool> {
        self.transition(message, MessageStatus::Sent).await
    }

    /// Lleva el mensaje por la progresión del perfil, persistiendo cada paso.
    /// Acepta mensajes en `pending` o ya en `sent`.
    pub async fn drive(
        &self,
        message: &mut CampaignMessage,
        profile: &SimulationProfile,
        shutdown: &mut ShutdownListener,
    ) -> Result<Progress> {
        if message.is_pending() && !self.mark_sent(message).await? {
            return Ok(Progress::Superseded);
        }
        ensure!(
            message.status == MessageStatus::Sent,
            "Mensaje {} en estado {}, se esperaba sent",
            message.id,
            message.status
        );

        let wait = self.random.delay_ms(profile.delivered_delay);
        if !shutdown.sleep(Duration::from_millis(wait)).await {
            return Ok(Progress::Interrupted);
        }
        if !self.transition(message, MessageStatus::Delivered).await? {
            return Ok(Progress::Superseded);
        }

        if self.roll(profile.read.probability) {
            let wait = self.random.delay_ms(profile.read.delay);
            if !shutdown.sleep(Duration::from_millis(wait)).await {
                return Ok(Progress::Interrupted);
            }
            if !self.transition(message, MessageStatus::Read).await? {
                return Ok(Progress::Superseded);
            }
        }

        if self.roll(profile.reply.probability) {
            let wait = self.random.delay_ms(profile.reply.delay);
            if !shutdown.sleep(Duration::from_millis(wait)).await {
                return Ok(Progress::Interrupted);
            }
            if !self.transition(message, MessageStatus::Replied).await? {
                return Ok(Progress::Superseded);
            }
        }

        if let Some(pacing) = profile.pacing {
            if !shutdown.sleep(pacing).await {
                return Ok(Progress::Interrupted);
            }
        }

        Ok(Progress::Finished)
    }

    /// Avanza la copia local y la persiste. Si el store ya tenía el mensaje
    /// igual o más adelante, recarga la copia local y devuelve `false`.
    async fn transition(&self, message: &mut CampaignMessage, next: MessageStatus) -> Result<bool> {
        message.advance(next, self.clock.now())?;
        if !self.store.save_message(message).await? {
            log::warn!(
                "(transition) Mensaje {} ya avanzado por otro envío, no se pisa con {}",
                message.id,
                next
            );
            if let Some(current) = self.store.load_message(&message.id).await? {
                *message = current;
            }
            return Ok(false);
        }
        log::debug!("(transition) Mensaje {} -> {}", message.id, next);
        Ok(true)
    }

    fn roll(&self, probability: f64) -> bool {
        if probability.is_nan() || probability <= 0.0 {
            false
        } else if probability >= 1.0 {
            true
        } else {
            self.random.chance(probability)
        }
    }
}
