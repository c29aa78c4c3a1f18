use axum::{
    Extension, Json,
    extract::{Query, State},
};
use tracing::{info, warn};

use edora_types::api::{AuditLogResponse, LimitQuery};

use crate::error::ApiError;
use crate::middleware::CurrentUser;
use crate::permissions::require_admin;
use crate::state::{AppState, blocking};
use crate::views;

/// Append an audit entry for a moderation or admin action. A failed write is
/// logged and does not fail the action itself.
pub async fn record(
    state: &AppState,
    actor: &CurrentUser,
    action: &'static str,
    object_type: &'static str,
    object_id: Option<i64>,
    data: Option<serde_json::Value>,
) {
    let actor_id = actor.id;
    let data = data.map(|d| d.to_string());
    let result = blocking(state, move |db| {
        db.insert_audit_log(Some(actor_id), action, object_type, object_id, data.as_deref())
    })
    .await;

    match result {
        Ok(()) => info!("Audit: user {} {} {} {:?}", actor_id, action, object_type, object_id),
        Err(e) => warn!("Failed to write audit entry {} for user {}: {}", action, actor_id, e),
    }
}

pub async fn list_audit_logs(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Query(query): Query<LimitQuery>,
) -> Result<Json<Vec<AuditLogResponse>>, ApiError> {
    require_admin(&user)?;
    let limit = query.limit.unwrap_or(50).min(500);
    let rows = blocking(&state, move |db| db.list_audit_logs(limit)).await?;
    Ok(Json(rows.into_iter().map(views::audit_log).collect()))
}
