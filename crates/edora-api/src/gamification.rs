use axum::{
    Extension, Json,
    extract::{Path, Query, State},
};
use tracing::{debug, warn};

use edora_types::api::{
    LeaderboardEntry, LimitQuery, PointTransactionResponse, PointsResponse, UserPointsResponse,
};
use edora_types::models::{ActionType, Badge};

use crate::error::ApiError;
use crate::middleware::CurrentUser;
use crate::state::{AppState, blocking};
use crate::views;

pub const POST_UPLOAD_POINTS: i64 = 10;
pub const COMMENT_POINTS: i64 = 5;
pub const LIKE_RECEIVED_POINTS: i64 = 1;

/// Apply a point change and record it. Never fails the caller: errors are
/// rolled back inside the database layer, logged here and reported as `false`.
pub async fn award_points(
    state: &AppState,
    user_id: i64,
    points: i64,
    action: ActionType,
    description: String,
    related_entity: Option<(i64, &'static str)>,
) -> bool {
    let result = blocking(state, move |db| {
        db.award_points(
            user_id,
            points,
            action.as_str(),
            &description,
            related_entity.map(|(id, _)| id),
            related_entity.map(|(_, kind)| kind),
        )
    })
    .await;

    match result {
        Ok(true) => {
            debug!("Awarded {} points to user {} ({})", points, user_id, action.as_str());
            true
        }
        Ok(false) => {
            warn!("Point award for unknown user {}", user_id);
            false
        }
        Err(e) => {
            warn!("Point award for user {} failed: {}", user_id, e);
            false
        }
    }
}

pub async fn remove_points(
    state: &AppState,
    user_id: i64,
    points: i64,
    action: ActionType,
    description: String,
    related_entity: Option<(i64, &'static str)>,
) -> bool {
    award_points(state, user_id, -points, action, description, related_entity).await
}

pub async fn my_points(Extension(user): Extension<CurrentUser>) -> Json<PointsResponse> {
    Json(PointsResponse {
        points: user.points,
        badge: Badge::for_points(user.points),
    })
}

pub async fn my_transactions(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Query(query): Query<LimitQuery>,
) -> Result<Json<Vec<PointTransactionResponse>>, ApiError> {
    let limit = query.limit.unwrap_or(50).min(200);
    let rows = blocking(&state, move |db| db.get_user_transactions(user.id, limit)).await?;
    let transactions = rows
        .into_iter()
        .map(views::point_transaction)
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Json(transactions))
}

pub async fn leaderboard(
    State(state): State<AppState>,
    Query(query): Query<LimitQuery>,
) -> Result<Json<Vec<LeaderboardEntry>>, ApiError> {
    let limit = query.limit.unwrap_or(10).min(100);
    let rows = blocking(&state, move |db| db.get_leaderboard(limit)).await?;
    Ok(Json(rows.into_iter().map(views::leaderboard_entry).collect()))
}

pub async fn user_points(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
) -> Result<Json<UserPointsResponse>, ApiError> {
    let points = blocking(&state, move |db| db.get_user_points(user_id))
        .await?
        .ok_or(ApiError::NotFound("User not found"))?;
    Ok(Json(UserPointsResponse { user_id, points }))
}
