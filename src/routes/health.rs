use axum::{extract::State, Json};
use serde_json::{json, Value};

use crate::AppState;

/// Health check endpoint
///
/// Reports whether the configured backing store answers a ping.
pub async fn health_check(State(state): State<AppState>) -> Json<Value> {
    let store_status = match state.store.ping().await {
        Ok(()) => "connected",
        Err(e) => {
            tracing::error!("Backing store health check failed: {}", e);
            "disconnected"
        }
    };

    Json(json!({
        "status": if store_status == "connected" { "healthy" } else { "unhealthy" },
        "store": state.store.backend_name(),
        "storeStatus": store_status,
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
