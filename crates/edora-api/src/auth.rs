use argon2::{
    Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
    password_hash::{SaltString, rand_core::OsRng},
};
use axum::{
    Extension, Json,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
};
use tracing::info;
use uuid::Uuid;

use edora_types::api::{
    LoginRequest, LoginResponse, MeResponse, RefreshRequest, RefreshResponse, RegisterRequest,
    RegisterResponse, UpdateUsernameRequest, UpdateUsernameResponse,
};
use edora_types::models::{Badge, Role, TokenKind};

use crate::error::ApiError;
use crate::middleware::CurrentUser;
use crate::state::{AppState, blocking};
use crate::tokens::{create_access_token, create_refresh_token, decode_token};

const MAX_USERNAME_LEN: usize = 50;

pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let email = req.email.trim().to_lowercase();
    if !looks_like_email(&email) {
        return Err(ApiError::bad_request("invalid email address"));
    }
    if req.password.len() < 8 {
        return Err(ApiError::bad_request("password must be at least 8 characters"));
    }
    let username = req
        .username
        .as_deref()
        .map(str::trim)
        .filter(|u| !u.is_empty())
        .map(str::to_string);
    if username.as_ref().is_some_and(|u| u.chars().count() > MAX_USERNAME_LEN) {
        return Err(ApiError::bad_request("Username must be at most 50 characters"));
    }

    let role = match req.role {
        Some(role) if state.settings.allow_role_signup => role,
        _ => Role::User,
    };

    let (email_taken, username_taken) = {
        let email = email.clone();
        let username = username.clone();
        blocking(&state, move |db| {
            let email_taken = db.get_user_by_email(&email)?.is_some();
            let username_taken = match &username {
                Some(u) => db.get_user_by_username(u)?.is_some(),
                None => false,
            };
            Ok((email_taken, username_taken))
        })
        .await?
    };
    if email_taken {
        return Err(ApiError::bad_request("email already registered"));
    }
    if username_taken {
        return Err(ApiError::bad_request("Username already taken"));
    }

    let password = req.password;
    let user = blocking(&state, move |db| {
        // Argon2id
        let salt = SaltString::generate(&mut OsRng);
        let password_hash = Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| anyhow::anyhow!("password hashing failed: {}", e))?
            .to_string();
        db.create_user(&email, username.as_deref(), &password_hash, role.as_str())
    })
    .await?
    // Lost a race with a concurrent registration
    .ok_or_else(|| ApiError::bad_request("email already registered"))?;

    info!("Registered user {} ({})", user.id, user.email);

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            id: user.id,
            email: user.email,
            username: user.username,
            role,
        }),
    ))
}

pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    let email = req.email.trim().to_lowercase();
    let password = req.password;

    let user = blocking(&state, move |db| {
        let Some(user) = db.get_user_by_email(&email)? else {
            return Ok(None);
        };
        let parsed_hash = PasswordHash::new(&user.hashed_password)
            .map_err(|e| anyhow::anyhow!("stored hash for user {} is invalid: {}", user.id, e))?;
        let verified = Argon2::default()
            .verify_password(password.as_bytes(), &parsed_hash)
            .is_ok();
        Ok(verified.then_some(user))
    })
    .await?
    .filter(|u| u.is_active)
    .ok_or_else(|| ApiError::bad_request("invalid credentials"))?;

    let settings = &state.settings;
    let jti = Uuid::new_v4().to_string();
    let access_token = create_access_token(&settings.jwt_secret, user.id, settings.access_ttl_minutes)?;
    let refresh_token =
        create_refresh_token(&settings.jwt_secret, user.id, &jti, settings.refresh_ttl_days)?;

    let user_id = user.id;
    let ttl_days = settings.refresh_ttl_days;
    blocking(&state, move |db| db.insert_refresh_token(&jti, user_id, ttl_days)).await?;

    info!("User {} logged in", user_id);

    Ok(Json(LoginResponse {
        access_token,
        refresh_token,
        token_type: "bearer".into(),
        user_id,
    }))
}

pub async fn refresh(
    State(state): State<AppState>,
    Json(req): Json<RefreshRequest>,
) -> Result<Json<RefreshResponse>, ApiError> {
    let user_id = live_refresh_token(&state, &req.refresh_token).await?.1;

    let user = blocking(&state, move |db| db.get_user_by_id(user_id))
        .await?
        .filter(|u| u.is_active)
        .ok_or(ApiError::Unauthorized("invalid refresh token"))?;

    let access_token = create_access_token(
        &state.settings.jwt_secret,
        user.id,
        state.settings.access_ttl_minutes,
    )?;

    Ok(Json(RefreshResponse {
        access_token,
        token_type: "bearer".into(),
    }))
}

pub async fn logout(
    State(state): State<AppState>,
    Json(req): Json<RefreshRequest>,
) -> Result<StatusCode, ApiError> {
    let (jti, user_id) = live_refresh_token(&state, &req.refresh_token).await?;
    blocking(&state, move |db| db.revoke_refresh_token(&jti)).await?;
    info!("User {} logged out", user_id);
    Ok(StatusCode::NO_CONTENT)
}

/// Validate a refresh JWT against its backing row. Returns the row id and
/// the user id.
async fn live_refresh_token(state: &AppState, token: &str) -> Result<(String, i64), ApiError> {
    let (claims, user_id) = decode_token(&state.settings.jwt_secret, token, TokenKind::Refresh)
        .ok_or(ApiError::Unauthorized("invalid refresh token"))?;
    let jti = claims.jti.ok_or(ApiError::Unauthorized("invalid refresh token"))?;

    let row = {
        let jti = jti.clone();
        blocking(state, move |db| db.get_refresh_token(&jti)).await?
    };
    match row {
        Some(row) if row.user_id == user_id && !row.revoked && !row.expired => Ok((jti, user_id)),
        _ => Err(ApiError::Unauthorized("invalid refresh token")),
    }
}

pub async fn me(Extension(user): Extension<CurrentUser>) -> Json<MeResponse> {
    Json(MeResponse {
        id: user.id,
        email: user.email,
        username: user.username,
        role: user.role,
        points: user.points,
        badge: Badge::for_points(user.points),
    })
}

pub async fn update_username(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Json(req): Json<UpdateUsernameRequest>,
) -> Result<Json<UpdateUsernameResponse>, ApiError> {
    let username = req.username.trim().to_string();
    if username.is_empty() {
        return Err(ApiError::bad_request("Username cannot be empty"));
    }
    if username.chars().count() > MAX_USERNAME_LEN {
        return Err(ApiError::bad_request("Username must be at most 50 characters"));
    }

    let user_id = user.id;
    let updated = {
        let username = username.clone();
        blocking(&state, move |db| {
            if let Some(holder) = db.get_user_by_username(&username)? {
                if holder.id != user_id {
                    return Ok(false);
                }
            }
            db.update_username(user_id, &username)
        })
        .await?
    };
    if !updated {
        return Err(ApiError::bad_request("Username already taken"));
    }

    Ok(Json(UpdateUsernameResponse {
        username,
        message: "Username updated successfully".into(),
    }))
}

/// `local@domain`, no whitespace, exactly one `@`.
fn looks_like_email(email: &str) -> bool {
    match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.is_empty()
                && !domain.contains('@')
                && !email.chars().any(char::is_whitespace)
        }
        None => false,
    }
}
