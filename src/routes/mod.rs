use actix_web::web;

pub mod backend_health;
pub mod webhook;

pub fn init_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(backend_health::backend_health).service(
        web::resource("/webhook").route(web::post().to(webhook::chat_webhook)),
    );
}
