use actix_web::{web, HttpRequest, HttpResponse};
use secrecy::{ExposeSecret, SecretString};

use crate::handlers::Router;
use crate::models::common::ApiResponse;
use crate::models::events::{InboundEvent, Update};

/// Header the chat platform echoes the configured secret back in.
const SECRET_TOKEN_HEADER: &str = "X-Telegram-Bot-Api-Secret-Token";

pub struct WebhookSettings {
    pub secret: Option<SecretString>,
}

/// Webhook entry point for chat-platform updates. Always answers 200 for
/// decodable updates: failures are scoped to the event and logged, never
/// bounced back to the platform (which would retry them).
pub async fn chat_webhook(
    router: web::Data<Router>,
    settings: web::Data<WebhookSettings>,
    request: HttpRequest,
    update: web::Json<Update>,
) -> HttpResponse {
    if let Some(secret) = &settings.secret {
        let provided = request
            .headers()
            .get(SECRET_TOKEN_HEADER)
            .and_then(|value| value.to_str().ok());
        if provided != Some(secret.expose_secret()) {
            tracing::warn!("webhook call with missing or wrong secret token");
            return HttpResponse::Unauthorized()
                .json(ApiResponse::<()>::error("Invalid webhook secret"));
        }
    }

    let update_id = update.update_id;
    match InboundEvent::from_update(update.into_inner()) {
        Some(event) => router.dispatch(event).await,
        None => tracing::debug!(update_id, "update kind not handled"),
    }

    HttpResponse::Ok().finish()
}
