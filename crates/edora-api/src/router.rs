use axum::{
    Json, Router,
    extract::DefaultBodyLimit,
    middleware,
    routing::{delete, get, post, put},
};
use serde_json::{Value, json};

use crate::middleware::require_auth;
use crate::state::AppState;
use crate::{
    audit, auth, channels, comments, files, flagged_words, gamification, leaderboard, posts,
    reactions, saved_posts, users,
};

/// Headroom for multipart framing on top of the file payloads.
const MULTIPART_OVERHEAD: usize = 1024 * 1024;

/// Whole-request cap for the upload route. Saturates for huge per-file limits.
fn upload_body_limit(max_upload_bytes: usize) -> usize {
    max_upload_bytes
        .saturating_mul(files::MAX_FILES_PER_UPLOAD)
        .saturating_add(MULTIPART_OVERHEAD)
}

/// Full HTTP surface: `/health` plus everything under `/api`.
/// Cross-cutting layers (CORS, tracing) are added by the binary.
pub fn build_router(state: AppState) -> Router {
    let upload_limit = upload_body_limit(state.settings.max_upload_bytes);

    let public_routes = Router::new()
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .route("/auth/refresh", post(auth::refresh))
        .route("/auth/logout", post(auth::logout))
        .route("/channels", get(channels::list_channels))
        .route("/channels/{channel_id}", get(channels::get_channel))
        .route("/reactions/post/{post_id}/counts", get(reactions::reaction_counts))
        .route("/gamification/leaderboard", get(gamification::leaderboard))
        .route("/files/{file_id}", get(files::download_file));

    let protected_routes = Router::new()
        // Auth
        .route("/auth/me", get(auth::me))
        .route("/auth/username", put(auth::update_username))
        // Users
        .route("/users/{user_id}/role", put(users::update_role))
        .route("/users/{user_id}/active", put(users::update_active))
        // Channels
        .route("/channels", post(channels::create_channel))
        .route(
            "/channels/{channel_id}",
            put(channels::update_channel).delete(channels::delete_channel),
        )
        .route("/channels/{channel_id}/join", post(channels::join_channel))
        .route("/channels/{channel_id}/leave", post(channels::leave_channel))
        .route("/channels/{channel_id}/members", get(channels::list_members))
        .route("/channels/{channel_id}/posts", get(channels::list_channel_posts))
        // Posts
        .route("/posts", get(posts::list_posts).post(posts::create_post))
        .route("/posts/flagged", get(posts::list_flagged_posts))
        .route(
            "/posts/{post_id}",
            get(posts::get_post).put(posts::update_post).delete(posts::delete_post),
        )
        .route("/posts/{post_id}/approve", post(posts::approve_post))
        // Comments
        .route("/comments", post(comments::create_comment))
        .route("/comments/post/{post_id}", get(comments::list_post_comments))
        .route(
            "/comments/{comment_id}",
            put(comments::update_comment).delete(comments::delete_comment),
        )
        // Reactions
        .route("/reactions", post(reactions::react))
        .route("/reactions/post/{post_id}", delete(reactions::remove_reaction))
        .route("/reactions/post/{post_id}/user", get(reactions::my_reaction))
        // Saved posts
        .route(
            "/saved-posts",
            get(saved_posts::list_saved_posts).post(saved_posts::save_post),
        )
        .route("/saved-posts/{post_id}", delete(saved_posts::unsave_post))
        .route("/saved-posts/check/{post_id}", get(saved_posts::check_saved))
        // Flagged words
        .route(
            "/flagged-words",
            get(flagged_words::list_words).post(flagged_words::add_word),
        )
        .route("/flagged-words/{word}", delete(flagged_words::delete_word))
        // Gamification
        .route("/gamification/my-points", get(gamification::my_points))
        .route("/gamification/my-transactions", get(gamification::my_transactions))
        .route("/gamification/user/{user_id}/points", get(gamification::user_points))
        .route("/leaderboard", get(leaderboard::top_users))
        .route("/leaderboard/rank", get(leaderboard::my_rank))
        // Files
        .route(
            "/files/upload",
            post(files::upload_files).layer(DefaultBodyLimit::max(upload_limit)),
        )
        // Audit
        .route("/audit-logs", get(audit::list_audit_logs))
        .layer(middleware::from_fn_with_state(state.clone(), require_auth));

    let api = Router::new().merge(public_routes).merge(protected_routes);

    Router::new()
        .route("/health", get(health))
        .nest("/api", api)
        .with_state(state)
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upload_limit_covers_every_file() {
        assert_eq!(upload_body_limit(1024), 10 * 1024 + MULTIPART_OVERHEAD);
        assert_eq!(upload_body_limit(usize::MAX), usize::MAX);
        assert_eq!(upload_body_limit(usize::MAX / 10), usize::MAX);
    }
}
