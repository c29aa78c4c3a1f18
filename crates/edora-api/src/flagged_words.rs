use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde_json::{Value, json};

use edora_types::api::{FlaggedWordRequest, FlaggedWordResponse};

use crate::audit;
use crate::error::ApiError;
use crate::middleware::CurrentUser;
use crate::permissions::require_moderator;
use crate::state::{AppState, blocking};
use crate::views;

const MAX_WORD_LEN: usize = 128;

fn normalize_word(word: &str) -> Result<String, ApiError> {
    let word = word.trim().to_lowercase();
    if word.is_empty() || word.chars().count() > MAX_WORD_LEN {
        return Err(ApiError::bad_request("Word must be 1-128 characters"));
    }
    Ok(word)
}

pub async fn list_words(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
) -> Result<Json<Vec<FlaggedWordResponse>>, ApiError> {
    require_moderator(&user)?;
    let rows = blocking(&state, |db| db.list_flagged_words()).await?;
    Ok(Json(rows.into_iter().map(views::flagged_word).collect()))
}

pub async fn add_word(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Json(req): Json<FlaggedWordRequest>,
) -> Result<impl IntoResponse, ApiError> {
    require_moderator(&user)?;
    let word = normalize_word(&req.word)?;

    let row = blocking(&state, move |db| db.add_flagged_word(&word))
        .await?
        .ok_or_else(|| ApiError::bad_request("Word already flagged"))?;

    audit::record(
        &state,
        &user,
        "flagged_word.add",
        "flagged_word",
        Some(row.id),
        Some(json!({ "word": row.word })),
    )
    .await;

    Ok((StatusCode::CREATED, Json(views::flagged_word(row))))
}

pub async fn delete_word(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(word): Path<String>,
) -> Result<Json<Value>, ApiError> {
    require_moderator(&user)?;
    let word = normalize_word(&word)?;

    let removed = {
        let word = word.clone();
        blocking(&state, move |db| db.delete_flagged_word(&word)).await?
    };
    if !removed {
        return Err(ApiError::NotFound("Word not found"));
    }

    audit::record(
        &state,
        &user,
        "flagged_word.delete",
        "flagged_word",
        None,
        Some(json!({ "word": word })),
    )
    .await;

    Ok(Json(json!({ "ok": true })))
}
