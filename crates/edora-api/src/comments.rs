use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use tracing::info;

use edora_db::models::CommentRow;
use edora_types::api::{
    CommentResponse, CommentWithAuthor, CreateCommentRequest, UpdateCommentRequest,
};
use edora_types::models::ActionType;

use crate::error::ApiError;
use crate::gamification::{self, COMMENT_POINTS};
use crate::middleware::CurrentUser;
use crate::permissions::{require_comment_delete_permission, require_comment_edit_permission};
use crate::posts::load_visible_post;
use crate::state::{AppState, blocking};
use crate::views;

fn validate_content(content: &str) -> Result<String, ApiError> {
    let content = content.trim();
    if content.is_empty() {
        return Err(ApiError::bad_request("Comment cannot be empty"));
    }
    Ok(content.to_string())
}

async fn load_comment(state: &AppState, comment_id: i64) -> Result<CommentRow, ApiError> {
    blocking(state, move |db| db.get_comment(comment_id))
        .await?
        .ok_or(ApiError::NotFound("Comment not found"))
}

pub async fn create_comment(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Json(req): Json<CreateCommentRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let content = validate_content(&req.content)?;
    let post = load_visible_post(&state, &user, req.post_id).await?;
    let post_id = post.id;

    if let Some(parent_id) = req.parent_id {
        let parent = blocking(&state, move |db| db.get_comment(parent_id)).await?;
        if !parent.is_some_and(|p| p.post_id == post_id) {
            return Err(ApiError::bad_request("Parent comment not found on this post"));
        }
    }

    let author_id = user.id;
    let parent_id = req.parent_id;
    let comment = blocking(&state, move |db| {
        db.create_comment(&content, post_id, author_id, parent_id)
    })
    .await?;

    gamification::award_points(
        &state,
        author_id,
        COMMENT_POINTS,
        ActionType::Comment,
        format!("Commented on post: {}", post.title),
        Some((comment.id, "comment")),
    )
    .await;

    Ok((StatusCode::CREATED, Json(views::comment(comment))))
}

pub async fn list_post_comments(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(post_id): Path<i64>,
) -> Result<Json<Vec<CommentWithAuthor>>, ApiError> {
    load_visible_post(&state, &user, post_id).await?;
    let rows = blocking(&state, move |db| db.list_comments_for_post(post_id)).await?;
    Ok(Json(rows.into_iter().map(views::comment_with_author).collect()))
}

pub async fn update_comment(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(comment_id): Path<i64>,
    Json(req): Json<UpdateCommentRequest>,
) -> Result<Json<CommentResponse>, ApiError> {
    let comment = load_comment(&state, comment_id).await?;
    load_visible_post(&state, &user, comment.post_id).await?;
    require_comment_edit_permission(&user, &comment)?;
    let content = validate_content(&req.content)?;

    let updated = blocking(&state, move |db| db.update_comment(comment_id, &content))
        .await?
        .ok_or(ApiError::NotFound("Comment not found"))?;
    Ok(Json(views::comment(updated)))
}

pub async fn delete_comment(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(comment_id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    let comment = load_comment(&state, comment_id).await?;
    load_visible_post(&state, &user, comment.post_id).await?;
    require_comment_delete_permission(&user, &comment)?;

    let removed = blocking(&state, move |db| db.delete_comment_tree(comment_id)).await?;
    info!("User {} deleted comment {} ({} rows)", user.id, comment_id, removed);

    Ok(StatusCode::NO_CONTENT)
}
