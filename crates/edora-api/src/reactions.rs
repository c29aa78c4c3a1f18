use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use tracing::debug;

use edora_db::models::PostRow;
use edora_types::api::{ReactionCounts, ReactionRequest, ReactionResponse};
use edora_types::models::{ActionType, ReactionType};

use crate::error::ApiError;
use crate::gamification::{self, LIKE_RECEIVED_POINTS};
use crate::middleware::CurrentUser;
use crate::posts::load_visible_post;
use crate::state::{AppState, blocking};
use crate::views;

/// Point change for the post author when a reaction moves from `before` to
/// `after`. Only gaining or losing a like counts.
fn like_delta(before: Option<ReactionType>, after: Option<ReactionType>) -> i64 {
    let was_like = before == Some(ReactionType::Like);
    let is_like = after == Some(ReactionType::Like);
    match (was_like, is_like) {
        (false, true) => LIKE_RECEIVED_POINTS,
        (true, false) => -LIKE_RECEIVED_POINTS,
        _ => 0,
    }
}

async fn settle_like_points(
    state: &AppState,
    user: &CurrentUser,
    post: &PostRow,
    before: Option<ReactionType>,
    after: Option<ReactionType>,
) {
    // No points for reacting to your own post
    if post.author_id == user.id {
        return;
    }
    let related = Some((post.id, "post"));
    match like_delta(before, after) {
        0 => {}
        delta if delta > 0 => {
            gamification::award_points(
                state,
                post.author_id,
                delta,
                ActionType::LikeReceived,
                format!("Received a like on post: {}", post.title),
                related,
            )
            .await;
        }
        delta => {
            gamification::remove_points(
                state,
                post.author_id,
                -delta,
                ActionType::LikeRemoved,
                format!("Lost a like on post: {}", post.title),
                related,
            )
            .await;
        }
    }
}

fn parse_previous(previous: Option<String>) -> Option<ReactionType> {
    previous.and_then(|p| match p.parse() {
        Ok(kind) => Some(kind),
        Err(e) => {
            debug!("Ignoring stored reaction: {}", e);
            None
        }
    })
}

pub async fn react(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Json(req): Json<ReactionRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let post = load_visible_post(&state, &user, req.post_id).await?;

    let post_id = post.id;
    let user_id = user.id;
    let reaction_type = req.reaction_type;
    let (row, previous) = blocking(&state, move |db| {
        db.upsert_reaction(post_id, user_id, reaction_type.as_str())
    })
    .await?;

    settle_like_points(&state, &user, &post, parse_previous(previous), Some(reaction_type)).await;

    Ok((StatusCode::CREATED, Json(views::reaction(row)?)))
}

pub async fn remove_reaction(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(post_id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    let post = load_visible_post(&state, &user, post_id).await?;

    let user_id = user.id;
    let removed = blocking(&state, move |db| db.delete_reaction(post_id, user_id))
        .await?
        .ok_or(ApiError::NotFound("Reaction not found"))?;

    settle_like_points(&state, &user, &post, parse_previous(Some(removed.reaction_type)), None).await;

    Ok(StatusCode::NO_CONTENT)
}

pub async fn reaction_counts(
    State(state): State<AppState>,
    Path(post_id): Path<i64>,
) -> Result<Json<ReactionCounts>, ApiError> {
    // Anonymous callers can't see flagged posts
    let counts = blocking(&state, move |db| {
        if !db.get_post(post_id)?.is_some_and(|p| !p.is_flagged) {
            return Ok(None);
        }
        db.reaction_counts(post_id).map(Some)
    })
    .await?;
    let (like_count, dislike_count) = counts.ok_or(ApiError::NotFound("Post not found"))?;
    Ok(Json(ReactionCounts {
        like_count,
        dislike_count,
    }))
}

pub async fn my_reaction(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(post_id): Path<i64>,
) -> Result<Json<Option<ReactionResponse>>, ApiError> {
    load_visible_post(&state, &user, post_id).await?;

    let user_id = user.id;
    let row = blocking(&state, move |db| db.get_user_reaction(post_id, user_id)).await?;
    Ok(Json(row.map(views::reaction).transpose()?))
}
