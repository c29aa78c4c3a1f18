use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::{ActionType, Badge, ReactionType, Role, TokenKind};

// -- JWT Claims --

/// JWT claims for both access and refresh tokens. `sub` carries the numeric
/// user id as a string; `jti` is only set on refresh tokens and names the
/// `refresh_tokens` row that backs them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub kind: TokenKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jti: Option<String>,
    pub iat: usize,
    pub exp: usize,
}

// -- Auth --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub role: Option<Role>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RegisterResponse {
    pub id: i64,
    pub email: String,
    pub username: Option<String>,
    pub role: Role,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LoginResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: String,
    pub user_id: i64,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RefreshResponse {
    pub access_token: String,
    pub token_type: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MeResponse {
    pub id: i64,
    pub email: String,
    pub username: Option<String>,
    pub role: Role,
    pub points: i64,
    pub badge: Option<Badge>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdateUsernameRequest {
    pub username: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UpdateUsernameResponse {
    pub username: String,
    pub message: String,
}

// -- Users --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdateRoleRequest {
    pub role: Role,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdateActiveRequest {
    pub is_active: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserSummary {
    pub id: i64,
    pub email: String,
    pub username: Option<String>,
    pub role: Role,
    pub points: i64,
    pub is_active: bool,
}

// -- Channels --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateChannelRequest {
    pub name: String,
    #[serde(default)]
    pub bio: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdateChannelRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub bio: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ChannelResponse {
    pub id: i64,
    pub name: String,
    pub bio: Option<String>,
    pub owner_id: i64,
    pub logo_filename: Option<String>,
    pub member_count: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MembershipResponse {
    pub channel_id: i64,
    pub user_id: i64,
    pub is_member: bool,
}

// -- Posts --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreatePostRequest {
    pub title: String,
    pub content: String,
    pub channel_id: i64,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdatePostRequest {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct PostQuery {
    pub channel_id: Option<i64>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PostResponse {
    pub id: i64,
    pub title: String,
    pub content: String,
    pub channel_id: i64,
    pub author_id: i64,
    pub is_flagged: bool,
    pub flag_reason: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub files: Vec<MediaFileResponse>,
}

// -- Files --

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaFileResponse {
    pub id: i64,
    pub filename: String,
    pub mime_type: String,
    pub size: i64,
    pub sha256: String,
    pub post_id: Option<i64>,
    pub uploaded_at: DateTime<Utc>,
}

// -- Comments --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateCommentRequest {
    pub content: String,
    pub post_id: i64,
    #[serde(default)]
    pub parent_id: Option<i64>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdateCommentRequest {
    pub content: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CommentResponse {
    pub id: i64,
    pub content: String,
    pub post_id: i64,
    pub author_id: i64,
    pub parent_id: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CommentWithAuthor {
    pub id: i64,
    pub content: String,
    pub post_id: i64,
    pub author_id: i64,
    pub parent_id: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub author_email: String,
    pub author_username: Option<String>,
}

// -- Reactions --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ReactionRequest {
    pub post_id: i64,
    pub reaction_type: ReactionType,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ReactionResponse {
    pub id: i64,
    pub reaction_type: ReactionType,
    pub post_id: i64,
    pub user_id: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ReactionCounts {
    pub like_count: i64,
    pub dislike_count: i64,
}

// -- Saved posts --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SavePostRequest {
    pub post_id: i64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SavedPostResponse {
    pub id: i64,
    pub user_id: i64,
    pub post_id: i64,
    pub saved_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SavedCheckResponse {
    pub is_saved: bool,
}

// -- Flagged words --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FlaggedWordRequest {
    pub word: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct FlaggedWordResponse {
    pub id: i64,
    pub word: String,
    pub created_at: DateTime<Utc>,
}

// -- Gamification --

#[derive(Debug, Deserialize)]
pub struct LimitQuery {
    pub limit: Option<u32>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PointsResponse {
    pub points: i64,
    pub badge: Option<Badge>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UserPointsResponse {
    pub user_id: i64,
    pub points: i64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PointTransactionResponse {
    pub id: i64,
    pub user_id: i64,
    pub points: i64,
    pub action_type: ActionType,
    pub description: String,
    pub related_entity_id: Option<i64>,
    pub related_entity_type: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    pub user_id: i64,
    pub email: String,
    pub username: Option<String>,
    pub points: i64,
    pub rank: i64,
    pub badge: Option<Badge>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RankResponse {
    pub user_id: i64,
    pub points: i64,
    pub rank: i64,
    pub badge: Option<Badge>,
}

// -- Audit --

#[derive(Debug, Serialize, Deserialize)]
pub struct AuditLogResponse {
    pub id: i64,
    pub actor_id: Option<i64>,
    pub action: String,
    pub object_type: String,
    pub object_id: Option<i64>,
    pub data: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
}
