//! Health check endpoint

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;

use crate::db;
use crate::state::AppState;

/// GET /health
///
/// `503` with `status: "degraded"` when the database does not answer.
pub async fn health_check(State(state): State<AppState>) -> (StatusCode, Json<serde_json::Value>) {
    let (status, code, database) = match db::ping(&state.pool).await {
        Ok(()) => ("ok", StatusCode::OK, "ok"),
        Err(e) => {
            tracing::warn!(error = %e, "Health check: database unavailable");
            ("degraded", StatusCode::SERVICE_UNAVAILABLE, "unavailable")
        }
    };

    (
        code,
        Json(serde_json::json!({
            "status": status,
            "service": "erp-server",
            "version": env!("CARGO_PKG_VERSION"),
            "database": database,
        })),
    )
}
