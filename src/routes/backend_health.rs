use actix_web::{get, HttpResponse, Responder};

use crate::models::common::ApiResponse;

#[get("/backend_health")]
async fn backend_health() -> impl Responder {
    HttpResponse::Ok().json(ApiResponse::<()>::success_message("ok"))
}
