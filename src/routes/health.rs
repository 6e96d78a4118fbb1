use actix_web::{get, web, HttpResponse};
use chrono::Utc;
use serde_json::json;

use crate::error::AppError;
use crate::repository::Repository;

/// Health check endpoint
///
/// Returns the service status and timestamp once the database answers.
#[get("/health")]
pub async fn health(repo: web::Data<dyn Repository>) -> Result<HttpResponse, AppError> {
    repo.ping().await?;
    Ok(HttpResponse::Ok().json(json!({
        "status": "ok",
        "timestamp": Utc::now()
    })))
}
