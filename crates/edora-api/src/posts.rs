use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde_json::json;
use tracing::info;

use edora_db::Database;
use edora_db::models::PostRow;
use edora_types::api::{CreatePostRequest, PostQuery, PostResponse, UpdatePostRequest};
use edora_types::models::ActionType;

use crate::audit;
use crate::error::ApiError;
use crate::gamification::{self, POST_UPLOAD_POINTS};
use crate::middleware::CurrentUser;
use crate::moderation;
use crate::permissions::{
    can_view_post, is_moderator, require_moderator, require_post_delete_permission,
    require_post_edit_permission,
};
use crate::state::{AppState, blocking};
use crate::views;

const MAX_TITLE_LEN: usize = 200;

/// Fetch a post the caller may see. Hidden posts are reported as missing.
pub(crate) async fn load_visible_post(
    state: &AppState,
    user: &CurrentUser,
    post_id: i64,
) -> Result<PostRow, ApiError> {
    blocking(state, move |db| db.get_post(post_id))
        .await?
        .filter(|post| can_view_post(user, post))
        .ok_or(ApiError::NotFound("Post not found"))
}

fn validate_title(title: &str) -> Result<String, ApiError> {
    let title = title.trim();
    if title.is_empty() || title.chars().count() > MAX_TITLE_LEN {
        return Err(ApiError::bad_request("Post title must be 1-200 characters"));
    }
    Ok(title.to_string())
}

fn scan_post(db: &Database, title: &str, content: &str) -> anyhow::Result<Option<String>> {
    let words: Vec<String> = db.list_flagged_words()?.into_iter().map(|w| w.word).collect();
    Ok(moderation::scan(&words, title, content))
}

pub async fn create_post(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Json(req): Json<CreatePostRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let title = validate_title(&req.title)?;
    let content = req.content;
    let channel_id = req.channel_id;
    let author_id = user.id;

    blocking(&state, move |db| db.get_channel(channel_id))
        .await?
        .ok_or(ApiError::NotFound("Channel not found"))?;

    let post = blocking(&state, move |db| {
        if db.post_title_taken(channel_id, &title, None)? {
            return Ok(None);
        }
        let flag_reason = scan_post(db, &title, &content)?;
        db.create_post(&title, &content, channel_id, author_id, flag_reason.as_deref())
    })
    .await?
    .ok_or_else(|| ApiError::bad_request("A post with this title already exists in this channel"))?;

    if post.is_flagged {
        info!("Post {} by user {} was flagged: {:?}", post.id, author_id, post.flag_reason);
    }

    gamification::award_points(
        &state,
        author_id,
        POST_UPLOAD_POINTS,
        ActionType::PostUpload,
        format!("Created post: {}", post.title),
        Some((post.id, "post")),
    )
    .await;

    Ok((StatusCode::CREATED, Json(views::post(&state, post).await?)))
}

pub async fn list_posts(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Query(query): Query<PostQuery>,
) -> Result<Json<Vec<PostResponse>>, ApiError> {
    let viewer_id = user.id;
    let include_flagged = is_moderator(&user);
    let rows = blocking(&state, move |db| {
        db.list_posts(query.channel_id, viewer_id, include_flagged)
    })
    .await?;
    Ok(Json(views::posts(&state, rows).await?))
}

pub async fn list_flagged_posts(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
) -> Result<Json<Vec<PostResponse>>, ApiError> {
    require_moderator(&user)?;
    let rows = blocking(&state, |db| db.list_flagged_posts()).await?;
    Ok(Json(views::posts(&state, rows).await?))
}

pub async fn get_post(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(post_id): Path<i64>,
) -> Result<Json<PostResponse>, ApiError> {
    let post = load_visible_post(&state, &user, post_id).await?;
    Ok(Json(views::post(&state, post).await?))
}

pub async fn update_post(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(post_id): Path<i64>,
    Json(req): Json<UpdatePostRequest>,
) -> Result<Json<PostResponse>, ApiError> {
    let post = load_visible_post(&state, &user, post_id).await?;
    require_post_edit_permission(&user, &post)?;

    let title = req.title.as_deref().map(validate_title).transpose()?;
    let content = req.content;
    let channel_id = post.channel_id;

    let updated = blocking(&state, move |db| {
        if let Some(title) = &title {
            if db.post_title_taken(channel_id, title, Some(post_id))? {
                return Ok(None);
            }
        }
        let flag_reason = scan_post(
            db,
            title.as_deref().unwrap_or(&post.title),
            content.as_deref().unwrap_or(&post.content),
        )?;
        if !db.update_post(post_id, title.as_deref(), content.as_deref(), flag_reason.as_deref())? {
            return Ok(None);
        }
        db.get_post(post_id)
    })
    .await?
    .ok_or_else(|| ApiError::bad_request("A post with this title already exists in this channel"))?;

    Ok(Json(views::post(&state, updated).await?))
}

pub async fn delete_post(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(post_id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    let post = load_visible_post(&state, &user, post_id).await?;
    require_post_delete_permission(&user, &post)?;

    let files = blocking(&state, move |db| db.delete_post(post_id)).await?;
    state.storage.delete_all(&files).await;

    info!("User {} deleted post {} ({} files)", user.id, post_id, files.len());
    if post.author_id != user.id {
        audit::record(
            &state,
            &user,
            "post.delete",
            "post",
            Some(post_id),
            Some(json!({ "title": post.title, "author_id": post.author_id })),
        )
        .await;
    }

    Ok(StatusCode::NO_CONTENT)
}

pub async fn approve_post(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(post_id): Path<i64>,
) -> Result<Json<PostResponse>, ApiError> {
    require_moderator(&user)?;

    let post = blocking(&state, move |db| {
        let Some(previous) = db.get_post(post_id)? else {
            return Ok(None);
        };
        db.approve_post(post_id)?;
        Ok(db.get_post(post_id)?.map(|post| (previous.flag_reason, post)))
    })
    .await?;
    let (reason, post) = post.ok_or(ApiError::NotFound("Post not found"))?;

    audit::record(
        &state,
        &user,
        "post.approve",
        "post",
        Some(post_id),
        Some(json!({ "flag_reason": reason })),
    )
    .await;

    Ok(Json(views::post(&state, post).await?))
}
