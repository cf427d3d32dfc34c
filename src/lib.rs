use actix_cors::Cors;
use actix_web::dev::Server;
use actix_web::{http, web, App, HttpServer};
use std::net::TcpListener;
use std::sync::Arc;
use tracing_actix_web::TracingLogger;

pub mod config;
pub mod db;
pub mod handlers;
pub mod models;
pub mod routes;
pub mod services;
pub mod telemetry;
pub mod utils;

use crate::handlers::Router;
use crate::routes::init_routes;
use crate::routes::webhook::WebhookSettings;

/// Build the HTTP server. Every collaborator comes in constructed:
/// the router already owns its store and channel client.
pub fn run(
    listener: TcpListener,
    router: Arc<Router>,
    webhook_settings: WebhookSettings,
) -> Result<Server, std::io::Error> {
    let router_data = web::Data::from(router);
    let webhook_data = web::Data::new(webhook_settings);

    let server = HttpServer::new(move || {
        // The companion web view calls the health endpoint cross-origin.
        let cors = Cors::default()
            .allowed_origin("http://localhost:3000")
            .allowed_origin("https://lepak.fly.dev")
            .allowed_methods(vec!["GET", "POST"])
            .allowed_headers(vec![http::header::ACCEPT, http::header::CONTENT_TYPE])
            .max_age(3600);

        App::new()
            .wrap(TracingLogger::default())
            .wrap(cors)
            .app_data(router_data.clone())
            .app_data(webhook_data.clone())
            .configure(init_routes)
    })
    .listen(listener)?
    .run();

    Ok(server)
}
