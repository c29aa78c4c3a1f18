use axum::{
    Extension, Json,
    extract::{Query, State},
};

use edora_types::api::{LeaderboardEntry, LimitQuery, RankResponse};
use edora_types::models::Badge;

use crate::error::ApiError;
use crate::middleware::CurrentUser;
use crate::state::{AppState, blocking};

/// Every user by score, zero-point accounts included. Ranks are positional.
pub async fn top_users(
    State(state): State<AppState>,
    Query(query): Query<LimitQuery>,
) -> Result<Json<Vec<LeaderboardEntry>>, ApiError> {
    let limit = query.limit.unwrap_or(10).min(100);
    let users = blocking(&state, move |db| db.get_top_users(limit)).await?;

    let entries = users
        .into_iter()
        .zip(1..)
        .map(|(u, rank)| LeaderboardEntry {
            badge: Badge::for_points(u.points),
            user_id: u.id,
            email: u.email,
            username: u.username,
            points: u.points,
            rank,
        })
        .collect();
    Ok(Json(entries))
}

pub async fn my_rank(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
) -> Result<Json<RankResponse>, ApiError> {
    let points = user.points;
    let rank = blocking(&state, move |db| db.rank_for_points(points)).await?;
    Ok(Json(RankResponse {
        user_id: user.id,
        points,
        rank,
        badge: Badge::for_points(points),
    }))
}
