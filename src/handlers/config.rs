use crate::{error::AppError, state::AppState};
use actix_web::{web, HttpResponse};
use chrono::Utc;
use serde_json::json;
use tracing::info;

pub async fn get_config(state: web::Data<AppState>) -> Result<HttpResponse, AppError> {
    let config = state.get_config();

    Ok(HttpResponse::Ok().json(json!({
        "timestamp": Utc::now().to_rfc3339(),
        "config": config.redacted()
    })))
}

/// Partial update of the non-secret settings.
pub async fn update_config(
    state: web::Data<AppState>,
    body: web::Json<serde_json::Value>,
) -> Result<HttpResponse, AppError> {
    let json_str = serde_json::to_string(&body.into_inner())?;

    let running = state.get_config();
    let mut updated = running.clone();
    updated
        .update_from_json(&json_str)
        .map_err(|e| AppError::ValidationError(e.to_string()))?;

    let restart_required = updated.restart_required(&running);
    state
        .update_config(updated.clone())
        .map_err(AppError::ValidationError)?;
    info!(?restart_required, "Configuration updated at runtime");

    let message = if restart_required.is_empty() {
        "Configuration updated successfully"
    } else {
        "Configuration saved; some settings apply after a restart"
    };

    Ok(HttpResponse::Ok().json(json!({
        "status": "success",
        "message": message,
        "restart_required": restart_required,
        "timestamp": Utc::now().to_rfc3339(),
        "updated_config": updated.redacted()
    })))
}
