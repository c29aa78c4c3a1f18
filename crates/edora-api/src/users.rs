use axum::{
    Extension, Json,
    extract::{Path, State},
};
use serde_json::json;
use tracing::info;

use edora_types::api::{UpdateActiveRequest, UpdateRoleRequest, UserSummary};

use crate::audit;
use crate::error::ApiError;
use crate::middleware::CurrentUser;
use crate::permissions::require_admin;
use crate::state::{AppState, blocking};
use crate::views;

pub async fn update_role(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(user_id): Path<i64>,
    Json(req): Json<UpdateRoleRequest>,
) -> Result<Json<UserSummary>, ApiError> {
    require_admin(&user)?;

    let role = req.role;
    let (previous, updated) = blocking(&state, move |db| {
        let Some(previous) = db.get_user_by_id(user_id)? else {
            return Ok(None);
        };
        let updated = db.update_role(user_id, role.as_str())?;
        Ok(updated.map(|u| (previous.role, u)))
    })
    .await?
    .ok_or(ApiError::NotFound("User not found"))?;

    audit::record(
        &state,
        &user,
        "user.role_update",
        "user",
        Some(user_id),
        Some(json!({ "from": previous, "to": role.as_str() })),
    )
    .await;

    Ok(Json(views::user_summary(updated)))
}

/// Deactivating an account also revokes its outstanding refresh tokens;
/// access tokens stop working on the next request.
pub async fn update_active(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(user_id): Path<i64>,
    Json(req): Json<UpdateActiveRequest>,
) -> Result<Json<UserSummary>, ApiError> {
    require_admin(&user)?;
    if user_id == user.id && !req.is_active {
        return Err(ApiError::bad_request("You cannot deactivate your own account"));
    }

    let is_active = req.is_active;
    let (updated, revoked) = blocking(&state, move |db| {
        if !db.set_user_active(user_id, is_active)? {
            return Ok(None);
        }
        let revoked = if is_active { 0 } else { db.revoke_user_refresh_tokens(user_id)? };
        Ok(db.get_user_by_id(user_id)?.map(|u| (u, revoked)))
    })
    .await?
    .ok_or(ApiError::NotFound("User not found"))?;

    info!("User {} set active={} (revoked {} refresh tokens)", user_id, is_active, revoked);
    audit::record(
        &state,
        &user,
        if is_active { "user.activate" } else { "user.deactivate" },
        "user",
        Some(user_id),
        Some(json!({ "revoked_tokens": revoked })),
    )
    .await;

    Ok(Json(views::user_summary(updated)))
}
