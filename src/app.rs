//! app.rs
use crate::handlers::{campaign_handler, message_handler};
use actix_web::web;

pub fn init_app(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api")
            .service(
                web::scope("/campaigns")
                    .route(
                        "",
                        web::post().to(campaign_handler::create_campaign_endpoint),
                    )
                    .route(
                        "/{id}",
                        web::get().to(campaign_handler::get_campaign_endpoint),
                    )
                    .route(
                        "/{id}/start",
                        web::post().to(campaign_handler::start_campaign_endpoint),
                    ),
            )
            .service(
                web::scope("/messages")
                    .route("/{id}/send", web::post().to(message_handler::send_message_endpoint)),
            ),
    );
}
