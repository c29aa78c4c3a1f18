use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde_json::json;
use tracing::info;

use edora_db::models::ChannelRow;
use edora_types::api::{
    ChannelResponse, CreateChannelRequest, MembershipResponse, PostResponse, UpdateChannelRequest,
    UserSummary,
};

use crate::audit;
use crate::error::ApiError;
use crate::middleware::CurrentUser;
use crate::permissions::{
    is_moderator, require_channel_delete_permission, require_channel_edit_permission,
};
use crate::state::{AppState, blocking};
use crate::views;

const MAX_CHANNEL_NAME_LEN: usize = 120;

fn validate_name(name: &str) -> Result<String, ApiError> {
    let name = name.trim();
    if name.is_empty() || name.chars().count() > MAX_CHANNEL_NAME_LEN {
        return Err(ApiError::bad_request("Channel name must be 1-120 characters"));
    }
    Ok(name.to_string())
}

pub(crate) async fn load_channel(state: &AppState, channel_id: i64) -> Result<ChannelRow, ApiError> {
    blocking(state, move |db| db.get_channel(channel_id))
        .await?
        .ok_or(ApiError::NotFound("Channel not found"))
}

pub async fn create_channel(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Json(req): Json<CreateChannelRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let name = validate_name(&req.name)?;
    let owner_id = user.id;

    let channel = blocking(&state, move |db| {
        if db.get_channel_by_name(&name)?.is_some() {
            return Ok(None);
        }
        db.create_channel(&name, req.bio.as_deref(), owner_id)
    })
    .await?
    .ok_or_else(|| ApiError::bad_request("Channel name already taken"))?;

    info!("User {} created channel {} ({})", owner_id, channel.id, channel.name);

    Ok((StatusCode::CREATED, Json(views::channel(channel))))
}

pub async fn list_channels(
    State(state): State<AppState>,
) -> Result<Json<Vec<ChannelResponse>>, ApiError> {
    let rows = blocking(&state, |db| db.list_channels()).await?;
    Ok(Json(rows.into_iter().map(views::channel).collect()))
}

pub async fn get_channel(
    State(state): State<AppState>,
    Path(channel_id): Path<i64>,
) -> Result<Json<ChannelResponse>, ApiError> {
    let channel = load_channel(&state, channel_id).await?;
    Ok(Json(views::channel(channel)))
}

pub async fn update_channel(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(channel_id): Path<i64>,
    Json(req): Json<UpdateChannelRequest>,
) -> Result<Json<ChannelResponse>, ApiError> {
    let channel = load_channel(&state, channel_id).await?;
    require_channel_edit_permission(&user, &channel)?;

    let name = req.name.as_deref().map(validate_name).transpose()?;
    let bio = req.bio;

    let updated = blocking(&state, move |db| {
        if let Some(name) = &name {
            if db.get_channel_by_name(name)?.is_some_and(|c| c.id != channel_id) {
                return Ok(None);
            }
        }
        if !db.update_channel(channel_id, name.as_deref(), bio.as_deref())? {
            return Ok(None);
        }
        db.get_channel(channel_id)
    })
    .await?
    .ok_or_else(|| ApiError::bad_request("Channel name already taken"))?;

    Ok(Json(views::channel(updated)))
}

pub async fn delete_channel(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(channel_id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    let channel = load_channel(&state, channel_id).await?;
    require_channel_delete_permission(&user, &channel)?;

    let files = blocking(&state, move |db| db.delete_channel(channel_id)).await?;
    state.storage.delete_all(&files).await;

    info!("User {} deleted channel {} ({} files)", user.id, channel_id, files.len());
    if channel.owner_id != user.id {
        audit::record(
            &state,
            &user,
            "channel.delete",
            "channel",
            Some(channel_id),
            Some(json!({ "name": channel.name, "owner_id": channel.owner_id })),
        )
        .await;
    }

    Ok(StatusCode::NO_CONTENT)
}

pub async fn join_channel(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(channel_id): Path<i64>,
) -> Result<Json<MembershipResponse>, ApiError> {
    load_channel(&state, channel_id).await?;
    let user_id = user.id;
    let joined = blocking(&state, move |db| db.join_channel(channel_id, user_id)).await?;
    if !joined {
        return Err(ApiError::bad_request("Already a member of this channel"));
    }
    Ok(Json(MembershipResponse {
        channel_id,
        user_id,
        is_member: true,
    }))
}

pub async fn leave_channel(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(channel_id): Path<i64>,
) -> Result<Json<MembershipResponse>, ApiError> {
    load_channel(&state, channel_id).await?;
    let user_id = user.id;
    let left = blocking(&state, move |db| db.leave_channel(channel_id, user_id)).await?;
    if !left {
        return Err(ApiError::bad_request("Not a member of this channel"));
    }
    Ok(Json(MembershipResponse {
        channel_id,
        user_id,
        is_member: false,
    }))
}

pub async fn list_members(
    State(state): State<AppState>,
    Path(channel_id): Path<i64>,
) -> Result<Json<Vec<UserSummary>>, ApiError> {
    load_channel(&state, channel_id).await?;
    let rows = blocking(&state, move |db| db.list_channel_members(channel_id)).await?;
    Ok(Json(rows.into_iter().map(views::user_summary).collect()))
}

pub async fn list_channel_posts(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(channel_id): Path<i64>,
) -> Result<Json<Vec<PostResponse>>, ApiError> {
    load_channel(&state, channel_id).await?;
    let viewer_id = user.id;
    let include_flagged = is_moderator(&user);
    let rows = blocking(&state, move |db| {
        db.list_posts(Some(channel_id), viewer_id, include_flagged)
    })
    .await?;
    Ok(Json(views::posts(&state, rows).await?))
}
