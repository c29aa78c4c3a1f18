use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};

use edora_types::api::{PostResponse, SavePostRequest, SavedCheckResponse};

use crate::error::ApiError;
use crate::middleware::CurrentUser;
use crate::permissions::can_view_post;
use crate::posts::load_visible_post;
use crate::state::{AppState, blocking};
use crate::views;

pub async fn save_post(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Json(req): Json<SavePostRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let post = load_visible_post(&state, &user, req.post_id).await?;

    let (user_id, post_id) = (user.id, post.id);
    let saved = blocking(&state, move |db| db.save_post(user_id, post_id))
        .await?
        .ok_or(ApiError::Conflict("Post already saved"))?;

    Ok((StatusCode::CREATED, Json(views::saved_post(saved))))
}

pub async fn unsave_post(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(post_id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    let user_id = user.id;
    let removed = blocking(&state, move |db| db.unsave_post(user_id, post_id)).await?;
    if !removed {
        return Err(ApiError::NotFound("Saved post not found"));
    }
    Ok(StatusCode::NO_CONTENT)
}

pub async fn list_saved_posts(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
) -> Result<Json<Vec<PostResponse>>, ApiError> {
    let user_id = user.id;
    let rows = blocking(&state, move |db| db.list_saved_posts(user_id)).await?;
    // A saved post may have been flagged since
    let rows = rows.into_iter().filter(|p| can_view_post(&user, p)).collect();
    Ok(Json(views::posts(&state, rows).await?))
}

pub async fn check_saved(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(post_id): Path<i64>,
) -> Result<Json<SavedCheckResponse>, ApiError> {
    let user_id = user.id;
    let is_saved = blocking(&state, move |db| db.is_post_saved(user_id, post_id)).await?;
    Ok(Json(SavedCheckResponse { is_saved }))
}
