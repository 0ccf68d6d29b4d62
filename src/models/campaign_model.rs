use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{anyhow, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::message_model::CampaignMessage;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CampaignStatus {
    Pending,
    Running,
    Completed,
}

impl CampaignStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CampaignStatus::Pending => "pending",
            CampaignStatus::Running => "running",
            CampaignStatus::Completed => "completed",
        }
    }
}

impl fmt::Display for CampaignStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CampaignStatus {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "pending" => Ok(CampaignStatus::Pending),
            "running" => Ok(CampaignStatus::Running),
            "completed" => Ok(CampaignStatus::Completed),
            other => Err(anyhow!("Estado de campaña desconocido: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Campaign {
    pub id: String,
    pub name: String,
    /// Mensajes por minuto; `None` o valores <= 0 usan el default.
    pub rate_limit: Option<i64>,
    pub status: CampaignStatus,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    /// En el orden en que fueron persistidos.
    pub messages: Vec<CampaignMessage>,
}

impl Campaign {
    pub fn effective_rate_limit(&self, default_rate_limit: u32) -> u32 {
        match self.rate_limit {
            Some(limit) if limit > 0 => u32::try_from(limit).unwrap_or(u32::MAX),
            _ => default_rate_limit.max(1),
        }
    }

    /// Pausa entre mensajes: 60000 / rate_limit ms.
    pub fn pacing_interval(&self, default_rate_limit: u32) -> Duration {
        let per_minute = u64::from(self.effective_rate_limit(default_rate_limit));
        Duration::from_millis(60_000 / per_minute)
    }

    /// Posiciones de los mensajes en `pending`, en orden de persistencia.
    pub fn pending_positions(&self) -> Vec<usize> {
        self.messages
            .iter()
            .enumerate()
            .filter(|(_, m)| m.is_pending())
            .map(|(idx, _)| idx)
            .collect()
    }

    pub fn mark_completed(&mut self, at: DateTime<Utc>) {
        self.status = CampaignStatus::Completed;
        self.completed_at = Some(at);
    }
}

/// Request para crear una campaña con un mensaje por destinatario
#[derive(Debug, Clone, Deserialize)]
pub struct CreateCampaignRequest {
    pub name: String,
    pub rate_limit: Option<i64>,
    pub content: String,
    pub recipients: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CampaignResponse {
    pub id: String,
    pub status: CampaignStatus,
    pub message: String,
}
