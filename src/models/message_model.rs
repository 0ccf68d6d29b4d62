//! models/message_model.rs
//! Mensajes de campaña y su progresión de estados.

use std::fmt;
use std::str::FromStr;

use anyhow::{anyhow, ensure, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Estados de un mensaje saliente. El orden de las variantes es el orden de
/// la progresión: un mensaje nunca retrocede.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageStatus {
    Pending,
    Sent,
    Delivered,
    Read,
    Replied,
}

impl MessageStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageStatus::Pending => "pending",
            MessageStatus::Sent => "sent",
            MessageStatus::Delivered => "delivered",
            MessageStatus::Read => "read",
            MessageStatus::Replied => "replied",
        }
    }

    /// Posición en la progresión (`pending` = 0).
    pub fn rank(&self) -> i64 {
        *self as i64
    }
}

impl fmt::Display for MessageStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MessageStatus {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "pending" => Ok(MessageStatus::Pending),
            "sent" => Ok(MessageStatus::Sent),
            "delivered" => Ok(MessageStatus::Delivered),
            "read" => Ok(MessageStatus::Read),
            "replied" => Ok(MessageStatus::Replied),
            other => Err(anyhow!("Estado de mensaje desconocido: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CampaignMessage {
    pub id: String,
    pub campaign_id: String,
    pub recipient: String,
    pub content: String,
    pub status: MessageStatus,
    pub created_at: DateTime<Utc>,
    pub sent_at: Option<DateTime<Utc>>,
    pub delivered_at: Option<DateTime<Utc>>,
    pub read_at: Option<DateTime<Utc>>,
    pub replied_at: Option<DateTime<Utc>>,
}

impl CampaignMessage {
    pub fn new(
        id: impl Into<String>,
        campaign_id: impl Into<String>,
        recipient: impl Into<String>,
        content: impl Into<String>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: id.into(),
            campaign_id: campaign_id.into(),
            recipient: recipient.into(),
            content: content.into(),
            status: MessageStatus::Pending,
            created_at,
            sent_at: None,
            delivered_at: None,
            read_at: None,
            replied_at: None,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.status == MessageStatus::Pending
    }

    /// Avanza al estado `next` y sella su timestamp.
    ///
    /// Solo se permite avanzar: `replied` puede alcanzarse sin pasar por
    /// `read`, pero nunca sin `sent` y `delivered`.
    pub fn advance(&mut self, next: MessageStatus, at: DateTime<Utc>) -> Result<()> {
        ensure!(
            next > self.status,
            "Transición inválida para mensaje {}: {} -> {}",
            self.id,
            self.status,
            next
        );
        if next >= MessageStatus::Read {
            ensure!(
                self.status >= MessageStatus::Delivered,
                "Mensaje {} no puede pasar a {} sin haber sido entregado",
                self.id,
                next
            );
        } else {
            ensure!(
                next as u8 == self.status as u8 + 1,
                "Mensaje {} no puede saltar de {} a {}",
                self.id,
                self.status,
                next
            );
        }

        let slot = match next {
            MessageStatus::Pending => None,
            MessageStatus::Sent => Some(&mut self.sent_at),
            MessageStatus::Delivered => Some(&mut self.delivered_at),
            MessageStatus::Read => Some(&mut self.read_at),
            MessageStatus::Replied => Some(&mut self.replied_at),
        };
        if let Some(slot) = slot {
            slot.get_or_insert(at);
        }
        self.status = next;
        Ok(())
    }
}
