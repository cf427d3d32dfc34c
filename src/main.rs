use std::net::TcpListener;
use std::sync::Arc;
use std::time::Duration;

use secrecy::ExposeSecret;
use sqlx::postgres::PgPoolOptions;

use lepak_backend::config::settings::get_config;
use lepak_backend::db::{PgRecordStore, RecordStore};
use lepak_backend::handlers::Router;
use lepak_backend::routes::webhook::WebhookSettings;
use lepak_backend::run;
use lepak_backend::services::channel::MessagingChannel;
use lepak_backend::services::TelegramChannel;
use lepak_backend::telemetry::{get_subscriber, init_subscriber};

#[tokio::main]
async fn main() -> std::io::Result<()> {
    // Panic if we can't read the config
    let config = get_config().expect("Failed to read the config.");

    let subscriber = get_subscriber(
        "lepak-backend".into(),
        config.application.log_level.clone(),
        std::io::stdout,
    );
    init_subscriber(subscriber);

    // Only try to establish connections when actually used
    let connection_pool = PgPoolOptions::new()
        .max_connections(16)
        .acquire_timeout(Duration::from_secs(10))
        .idle_timeout(Duration::from_secs(600))
        .connect_lazy(config.database.connection_string().expose_secret())
        .expect("Failed to create Postgres connection pool");

    let store: Arc<dyn RecordStore> = Arc::new(PgRecordStore::new(connection_pool));
    let channel: Arc<dyn MessagingChannel> = Arc::new(TelegramChannel::new(
        config.channel.bot_token.expose_secret(),
    ));
    let router = Arc::new(Router::new(store, channel));

    let address = format!("{}:{}", config.application.host, config.application.port);
    let listener = TcpListener::bind(&address)?;
    tracing::info!("webhook server listening on {}", address);

    let webhook_settings = WebhookSettings {
        secret: config.channel.webhook_secret.clone(),
    };
    run(listener, router, webhook_settings)?.await
}
