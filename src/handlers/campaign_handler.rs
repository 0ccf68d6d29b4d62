//! handlers/campaign_handler.rs
use actix_web::{web, HttpResponse};
use serde_json::json;

use crate::models::campaign_model::{CampaignResponse, CampaignStatus, CreateCampaignRequest};
use crate::services::campaign_dispatcher::CampaignQueue;
use crate::services::campaign_store::{CampaignStore, SqliteCampaignStore};

/// POST /api/campaigns
pub async fn create_campaign_endpoint(
    store: web::Data<SqliteCampaignStore>,
    body: web::Json<CreateCampaignRequest>,
) -> HttpResponse {
    let req = body.into_inner();
    if req.recipients.is_empty() {
        return HttpResponse::BadRequest().json(json!({
            "error": "recipients required"
        }));
    }

    match store.create_campaign(req).await {
        Ok(campaign) => HttpResponse::Ok().json(campaign),
        Err(e) => HttpResponse::InternalServerError().json(json!({
            "error": "Internal server error",
            "details": format!("{:?}", e)
        })),
    }
}

/// GET /api/campaigns/{id}
pub async fn get_campaign_endpoint(
    store: web::Data<SqliteCampaignStore>,
    path: web::Path<String>,
) -> HttpResponse {
    let campaign_id = path.into_inner();

    match store.load_campaign_with_messages(&campaign_id).await {
        Ok(Some(campaign)) => HttpResponse::Ok().json(campaign),
        Ok(None) => HttpResponse::NotFound().json(json!({
            "error": "Campaign not found"
        })),
        Err(e) => HttpResponse::InternalServerError().json(json!({
            "error": "Internal server error",
            "details": format!("{:?}", e)
        })),
    }
}

/// POST /api/campaigns/{id}/start
/// Marca la campaña en "running" y la encola; el worker la procesa después.
pub async fn start_campaign_endpoint(
    store: web::Data<SqliteCampaignStore>,
    queue: web::Data<CampaignQueue>,
    path: web::Path<String>,
) -> HttpResponse {
    let campaign_id = path.into_inner();

    match store.mark_campaign_running(&campaign_id).await {
        Ok(true) => {
            queue.enqueue(campaign_id.clone());
            log::info!("(start_campaign) Campaña {} encolada", campaign_id);
            HttpResponse::Accepted().json(CampaignResponse {
                id: campaign_id,
                status: CampaignStatus::Running,
                message: "Campaign queued".to_string(),
            })
        }
        Ok(false) => HttpResponse::NotFound().json(json!({
            "error": "Campaign not found"
        })),
        Err(e) => HttpResponse::InternalServerError().json(json!({
            "error": "Internal server error",
            "details": format!("{:?}", e)
        })),
    }
}
