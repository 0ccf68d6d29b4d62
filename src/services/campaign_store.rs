//! services/campaign_store.rs
//! Acceso a campañas y mensajes. El despachador solo lee y actualiza;
//! la creación queda del lado de los handlers.

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::{Pool, Row, Sqlite};
use uuid::Uuid;

use crate::models::{
    campaign_model::{Campaign, CampaignStatus, CreateCampaignRequest},
    message_model::CampaignMessage,
};

#[async_trait]
pub trait CampaignStore: Send + Sync {
    /// La campaña con todos sus mensajes, o `None` si no existe.
    async fn load_campaign_with_messages(&self, campaign_id: &str) -> Result<Option<Campaign>>;

    async fn load_message(&self, message_id: &str) -> Result<Option<CampaignMessage>>;

    /// Persiste estado y timestamps del mensaje solo si el estado guardado
    /// está por detrás del nuevo. `false` si otro escritor ya lo avanzó.
    async fn save_message(&self, message: &CampaignMessage) -> Result<bool>;

    /// Persiste estado y fecha de finalización de la campaña.
    async fn save_campaign(&self, campaign: &Campaign) -> Result<()>;
}

#[derive(Clone, Debug)]
pub struct SqliteCampaignStore {
    db_pool: Pool<Sqlite>,
}

fn to_text(at: Option<DateTime<Utc>>) -> Option<String> {
    at.map(|t| t.to_rfc3339())
}

fn parse_time(raw: Option<String>) -> Result<Option<DateTime<Utc>>> {
    raw.map(|s| {
        DateTime::parse_from_rfc3339(&s)
            .map(|t| t.with_timezone(&Utc))
            .with_context(|| format!("Fecha inválida en DB: {}", s))
    })
    .transpose()
}

fn message_from_row(row: &SqliteRow) -> Result<CampaignMessage> {
    let status: String = row.try_get("status")?;
    let created_at: String = row.try_get("created_at")?;
    Ok(CampaignMessage {
        id: row.try_get("id")?,
        campaign_id: row.try_get("campaign_id")?,
        recipient: row.try_get("recipient")?,
        content: row.try_get("content")?,
        status: status.parse()?,
        created_at: parse_time(Some(created_at))?.unwrap_or_default(),
        sent_at: parse_time(row.try_get("sent_at")?)?,
        delivered_at: parse_time(row.try_get("delivered_at")?)?,
        read_at: parse_time(row.try_get("read_at")?)?,
        replied_at: parse_time(row.try_get("replied_at")?)?,
    })
}

const MESSAGE_COLUMNS: &str = r#"
    id, campaign_id, recipient, content, status, created_at,
    sent_at, delivered_at, read_at, replied_at
"#;

impl SqliteCampaignStore {
    pub fn new(db_pool: Pool<Sqlite>) -> Self {
        SqliteCampaignStore { db_pool }
    }

    /// Corre migraciones con sqlx
    pub async fn run_migrations(&self) -> Result<()> {
        sqlx::migrate!("./migrations")
            .run(&self.db_pool)
            .await
            .context("Fallo en migraciones de campañas")?;
        Ok(())
    }

    /// Crea la campaña en "pending" con un mensaje pendiente por destinatario.
    pub async fn create_campaign(&self, req: CreateCampaignRequest) -> Result<Campaign> {
        let now = Utc::now();
        let campaign_id = Uuid::new_v4().to_string();

        let mut tx = self.db_pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO campaigns (id, name, rate_limit, status, created_at, completed_at)
            VALUES (?1, ?2, ?3, 'pending', ?4, NULL)
            "#,
        )
        .bind(&campaign_id)
        .bind(&req.name)
        .bind(req.rate_limit)
        .bind(now.to_rfc3339())
        .execute(&mut *tx)
        .await
        .context("Fallo al insertar campaña")?;

        let mut messages = Vec::with_capacity(req.recipients.len());
        for recipient in &req.recipients {
            let message = CampaignMessage::new(
                Uuid::new_v4().to_string(),
                campaign_id.clone(),
                recipient.clone(),
                req.content.clone(),
                now,
            );
            sqlx::query(
                r#"
                INSERT INTO campaign_messages (id, campaign_id, recipient, content, status, created_at)
                VALUES (?1, ?2, ?3, ?4, 'pending', ?5)
                "#,
            )
            .bind(&message.id)
            .bind(&message.campaign_id)
            .bind(&message.recipient)
            .bind(&message.content)
            .bind(now.to_rfc3339())
            .execute(&mut *tx)
            .await
            .context("Fallo al insertar mensaje de campaña")?;
            messages.push(message);
        }

        tx.commit().await?;

        Ok(Campaign {
            id: campaign_id,
            name: req.name,
            rate_limit: req.rate_limit,
            status: CampaignStatus::Pending,
            created_at: now,
            completed_at: None,
            messages,
        })
    }

    /// Pasa la campaña a "running". Devuelve `false` si no existe.
    pub async fn mark_campaign_running(&self, campaign_id: &str) -> Result<bool> {
        let result = sqlx::query(r#"UPDATE campaigns SET status = ?1 WHERE id = ?2"#)
            .bind(CampaignStatus::Running.as_str())
            .bind(campaign_id)
            .execute(&self.db_pool)
            .await
            .context("Fallo al actualizar campaña")?;
        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl CampaignStore for SqliteCampaignStore {
    async fn load_campaign_with_messages(&self, campaign_id: &str) -> Result<Option<Campaign>> {
        let row = sqlx::query(
            r#"
            SELECT id, name, rate_limit, status, created_at, completed_at
            FROM campaigns
            WHERE id = ?1
            "#,
        )
        .bind(campaign_id)
        .fetch_optional(&self.db_pool)
        .await
        .context("Fallo al leer campaña")?;

        let Some(row) = row else {
            return Ok(None);
        };

        let sql = format!(
            "SELECT {MESSAGE_COLUMNS} FROM campaign_messages WHERE campaign_id = ?1 ORDER BY rowid"
        );
        let message_rows = sqlx::query(&sql)
            .bind(campaign_id)
            .fetch_all(&self.db_pool)
            .await
            .context("Fallo al leer mensajes de campaña")?;

        let mut messages = Vec::with_capacity(message_rows.len());
        for r in &message_rows {
            messages.push(message_from_row(r)?);
        }

        let status: String = row.try_get("status")?;
        let created_at: String = row.try_get("created_at")?;
        Ok(Some(Campaign {
            id: row.try_get("id")?,
            name: row.try_get("name")?,
            rate_limit: row.try_get("rate_limit")?,
            status: status.parse()?,
            created_at: parse_time(Some(created_at))?.unwrap_or_default(),
            completed_at: parse_time(row.try_get("completed_at")?)?,
            messages,
        }))
    }

    async fn load_message(&self, message_id: &str) -> Result<Option<CampaignMessage>> {
        let sql = format!("SELECT {MESSAGE_COLUMNS} FROM campaign_messages WHERE id = ?1");
        let row = sqlx::query(&sql)
            .bind(message_id)
            .fetch_optional(&self.db_pool)
            .await
            .context("Fallo al leer mensaje")?;

        row.as_ref().map(message_from_row).transpose()
    }

    async fn save_message(&self, message: &CampaignMessage) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE campaign_messages
            SET status = ?1,
                sent_at = ?2,
                delivered_at = ?3,
                read_at = ?4,
                replied_at = ?5
            WHERE id = ?6
              AND (CASE status
                     WHEN 'pending' THEN 0
                     WHEN 'sent' THEN 1
                     WHEN 'delivered' THEN 2
                     WHEN 'read' THEN 3
                     WHEN 'replied' THEN 4
                   END) < ?7
            "#,
        )
        .bind(message.status.as_str())
        .bind(to_text(message.sent_at))
        .bind(to_text(message.delivered_at))
        .bind(to_text(message.read_at))
        .bind(to_text(message.replied_at))
        .bind(&message.id)
        .bind(message.status.rank())
        .execute(&self.db_pool)
        .await
        .with_context(|| format!("Fallo al guardar mensaje {}", message.id))?;

        Ok(result.rows_affected() > 0)
    }

    async fn save_campaign(&self, campaign: &Campaign) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE campaigns
            SET status = ?1,
                completed_at = ?2
            WHERE id = ?3
            "#,
        )
        .bind(campaign.status.as_str())
        .bind(to_text(campaign.completed_at))
        .bind(&campaign.id)
        .execute(&self.db_pool)
        .await
        .with_context(|| format!("Fallo al guardar campaña {}", campaign.id))?;

        Ok(())
    }
}
