//! handlers/message_handler.rs
use actix_web::{web, HttpResponse};
use serde_json::json;

use crate::services::direct_send::DirectSendService;

/// POST /api/messages/{id}/send
pub async fn send_message_endpoint(
    direct_send: web::Data<DirectSendService>,
    path: web::Path<String>,
) -> HttpResponse {
    let message_id = path.into_inner();

    match direct_send.send_message(&message_id).await {
        Ok(Some(message)) => HttpResponse::Ok().json(message),
        Ok(None) => HttpResponse::NotFound().json(json!({
            "error": "Message not found"
        })),
        Err(e) => {
            log::error!("Message send error: {}", e);
            HttpResponse::InternalServerError().json(json!({
                "success": false,
                "error": e.to_string()
            }))
        }
    }
}
