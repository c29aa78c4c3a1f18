//! Row to response conversions.

use std::collections::HashMap;

use chrono::{DateTime, NaiveDateTime, Utc};
use tracing::warn;

use edora_db::models::{
    AuditLogRow, ChannelRow, CommentRow, CommentWithAuthorRow, FlaggedWordRow, LeaderboardRow,
    MediaFileRow, PointTransactionRow, PostRow, ReactionRow, SavedPostRow, UserRow,
};
use edora_types::api::{
    AuditLogResponse, ChannelResponse, CommentResponse, CommentWithAuthor, FlaggedWordResponse,
    LeaderboardEntry, MediaFileResponse, PointTransactionResponse, PostResponse, ReactionResponse,
    SavedPostResponse, UserSummary,
};
use edora_types::models::{ActionType, Badge, ReactionType, Role};

use crate::error::ApiError;
use crate::state::{AppState, blocking};

/// SQLite's `datetime('now')` text, or RFC 3339. Unparseable values fall
/// back to the epoch rather than failing the whole response.
pub(crate) fn parse_timestamp(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f").map(|dt| dt.and_utc()))
        .unwrap_or_else(|e| {
            warn!("Unparseable timestamp {:?}: {}", s, e);
            DateTime::<Utc>::default()
        })
}

pub(crate) fn parse_role(user_id: i64, role: &str) -> Role {
    role.parse().unwrap_or_else(|e| {
        warn!("User {} has unknown role: {}", user_id, e);
        Role::User
    })
}

pub(crate) fn user_summary(row: UserRow) -> UserSummary {
    UserSummary {
        role: parse_role(row.id, &row.role),
        id: row.id,
        email: row.email,
        username: row.username,
        points: row.points,
        is_active: row.is_active,
    }
}

pub(crate) fn channel(row: ChannelRow) -> ChannelResponse {
    ChannelResponse {
        id: row.id,
        name: row.name,
        bio: row.bio,
        owner_id: row.owner_id,
        logo_filename: row.logo_filename,
        member_count: row.member_count,
        created_at: parse_timestamp(&row.created_at),
        updated_at: parse_timestamp(&row.updated_at),
    }
}

pub(crate) fn media_file(row: MediaFileRow) -> MediaFileResponse {
    MediaFileResponse {
        id: row.id,
        filename: row.filename,
        mime_type: row.mime_type,
        size: row.size,
        sha256: row.sha256,
        post_id: row.post_id,
        uploaded_at: parse_timestamp(&row.uploaded_at),
    }
}

fn post_with_files(row: PostRow, files: Vec<MediaFileResponse>) -> PostResponse {
    PostResponse {
        id: row.id,
        title: row.title,
        content: row.content,
        channel_id: row.channel_id,
        author_id: row.author_id,
        is_flagged: row.is_flagged,
        flag_reason: row.flag_reason,
        created_at: parse_timestamp(&row.created_at),
        updated_at: parse_timestamp(&row.updated_at),
        files,
    }
}

/// Build post responses with their media files attached, in one query.
pub(crate) async fn posts(state: &AppState, rows: Vec<PostRow>) -> Result<Vec<PostResponse>, ApiError> {
    let ids: Vec<i64> = rows.iter().map(|p| p.id).collect();
    let files = blocking(state, move |db| db.get_files_for_posts(&ids)).await?;

    let mut by_post: HashMap<i64, Vec<MediaFileResponse>> = HashMap::new();
    for file in files {
        if let Some(post_id) = file.post_id {
            by_post.entry(post_id).or_default().push(media_file(file));
        }
    }

    Ok(rows
        .into_iter()
        .map(|row| {
            let files = by_post.remove(&row.id).unwrap_or_default();
            post_with_files(row, files)
        })
        .collect())
}

pub(crate) async fn post(state: &AppState, row: PostRow) -> Result<PostResponse, ApiError> {
    let mut list = posts(state, vec![row]).await?;
    list.pop()
        .ok_or_else(|| ApiError::Internal(anyhow::anyhow!("post response went missing")))
}

pub(crate) fn comment(row: CommentRow) -> CommentResponse {
    CommentResponse {
        id: row.id,
        content: row.content,
        post_id: row.post_id,
        author_id: row.author_id,
        parent_id: row.parent_id,
        created_at: parse_timestamp(&row.created_at),
        updated_at: parse_timestamp(&row.updated_at),
    }
}

pub(crate) fn comment_with_author(row: CommentWithAuthorRow) -> CommentWithAuthor {
    let c = row.comment;
    CommentWithAuthor {
        id: c.id,
        content: c.content,
        post_id: c.post_id,
        author_id: c.author_id,
        parent_id: c.parent_id,
        created_at: parse_timestamp(&c.created_at),
        updated_at: parse_timestamp(&c.updated_at),
        author_email: row.author_email,
        author_username: row.author_username,
    }
}

pub(crate) fn reaction(row: ReactionRow) -> Result<ReactionResponse, ApiError> {
    let reaction_type: ReactionType = row
        .reaction_type
        .parse()
        .map_err(|e| ApiError::Internal(anyhow::anyhow!("reaction {}: {}", row.id, e)))?;
    Ok(ReactionResponse {
        id: row.id,
        reaction_type,
        post_id: row.post_id,
        user_id: row.user_id,
        created_at: parse_timestamp(&row.created_at),
        updated_at: parse_timestamp(&row.updated_at),
    })
}

pub(crate) fn saved_post(row: SavedPostRow) -> SavedPostResponse {
    SavedPostResponse {
        id: row.id,
        user_id: row.user_id,
        post_id: row.post_id,
        saved_at: parse_timestamp(&row.saved_at),
    }
}

pub(crate) fn flagged_word(row: FlaggedWordRow) -> FlaggedWordResponse {
    FlaggedWordResponse {
        id: row.id,
        word: row.word,
        created_at: parse_timestamp(&row.created_at),
    }
}

pub(crate) fn point_transaction(row: PointTransactionRow) -> Result<PointTransactionResponse, ApiError> {
    let action_type: ActionType = row
        .action_type
        .parse()
        .map_err(|e| ApiError::Internal(anyhow::anyhow!("transaction {}: {}", row.id, e)))?;
    Ok(PointTransactionResponse {
        id: row.id,
        user_id: row.user_id,
        points: row.points,
        action_type,
        description: row.description,
        related_entity_id: row.related_entity_id,
        related_entity_type: row.related_entity_type,
        created_at: parse_timestamp(&row.created_at),
    })
}

pub(crate) fn leaderboard_entry(row: LeaderboardRow) -> LeaderboardEntry {
    LeaderboardEntry {
        badge: Badge::for_points(row.points),
        user_id: row.user_id,
        email: row.email,
        username: row.username,
        points: row.points,
        rank: row.rank,
    }
}

pub(crate) fn audit_log(row: AuditLogRow) -> AuditLogResponse {
    let data = row.data.as_deref().and_then(|d| match serde_json::from_str(d) {
        Ok(value) => Some(value),
        Err(e) => {
            warn!("Audit log {} has malformed data: {}", row.id, e);
            None
        }
    });
    AuditLogResponse {
        id: row.id,
        actor_id: row.actor_id,
        action: row.action,
        object_type: row.object_type,
        object_id: row.object_id,
        data,
        created_at: parse_timestamp(&row.created_at),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};

    #[test]
    fn sqlite_and_rfc3339_timestamps_parse() {
        let dt = parse_timestamp("2024-03-05 14:07:09");
        assert_eq!((dt.year(), dt.month(), dt.day()), (2024, 3, 5));
        assert_eq!((dt.hour(), dt.minute(), dt.second()), (14, 7, 9));

        let dt = parse_timestamp("2024-03-05T14:07:09+02:00");
        assert_eq!(dt.hour(), 12);

        assert_eq!(parse_timestamp("garbage"), DateTime::<Utc>::default());
    }

    #[test]
    fn leaderboard_entries_carry_badges() {
        let entry = leaderboard_entry(LeaderboardRow {
            user_id: 1,
            email: "a@b.c".into(),
            username: None,
            points: 640,
            rank: 1,
        });
        assert_eq!(entry.badge, Some(Badge::Silver));
    }
}
