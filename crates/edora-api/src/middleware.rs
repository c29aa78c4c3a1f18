use axum::{
    extract::{Request, State},
    http::{HeaderMap, header},
    middleware::Next,
    response::Response,
};

use edora_db::models::UserRow;
use edora_types::models::{Role, TokenKind};

use crate::error::ApiError;
use crate::state::{AppState, blocking};
use crate::tokens::decode_token;
use crate::views;

/// The authenticated caller, loaded fresh from the database on every request.
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub id: i64,
    pub email: String,
    pub username: Option<String>,
    pub role: Role,
    pub points: i64,
}

impl From<UserRow> for CurrentUser {
    fn from(row: UserRow) -> Self {
        let role = views::parse_role(row.id, &row.role);
        Self {
            id: row.id,
            email: row.email,
            username: row.username,
            role,
            points: row.points,
        }
    }
}

/// Resolve the bearer access token to an active user and attach it as a
/// `CurrentUser` request extension.
pub async fn require_auth(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let user_id = {
        let token = bearer_token(req.headers()).ok_or(ApiError::Unauthorized("invalid token"))?;
        let (_, user_id) = decode_token(&state.settings.jwt_secret, token, TokenKind::Access)
            .ok_or(ApiError::Unauthorized("invalid token"))?;
        user_id
    };

    let user = blocking(&state, move |db| db.get_user_by_id(user_id))
        .await?
        .filter(|u| u.is_active)
        .ok_or(ApiError::Unauthorized("inactive / unknown user"))?;

    req.extensions_mut().insert(CurrentUser::from(user));
    Ok(next.run(req).await)
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn bearer_prefix_is_required() {
        let mut headers = HeaderMap::new();
        assert_eq!(bearer_token(&headers), None);

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Basic abc"));
        assert_eq!(bearer_token(&headers), None);

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer abc.def"));
        assert_eq!(bearer_token(&headers), Some("abc.def"));

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer "));
        assert_eq!(bearer_token(&headers), None);
    }
}
