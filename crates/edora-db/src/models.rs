//! Database row types. These map directly to SQLite rows and stay
//! independent of the edora-types API models; timestamps are kept as the
//! `YYYY-MM-DD HH:MM:SS` text SQLite produces.

use rusqlite::Row;

#[derive(Debug, Clone)]
pub struct UserRow {
    pub id: i64,
    pub email: String,
    pub username: Option<String>,
    pub hashed_password: String,
    pub role: String,
    pub points: i64,
    pub is_active: bool,
    pub created_at: String,
    pub updated_at: String,
}

impl UserRow {
    pub(crate) const COLUMNS: &'static str =
        "id, email, username, hashed_password, role, points, is_active, created_at, updated_at";

    pub(crate) fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            email: row.get(1)?,
            username: row.get(2)?,
            hashed_password: row.get(3)?,
            role: row.get(4)?,
            points: row.get(5)?,
            is_active: row.get(6)?,
            created_at: row.get(7)?,
            updated_at: row.get(8)?,
        })
    }
}

#[derive(Debug, Clone)]
pub struct ChannelRow {
    pub id: i64,
    pub name: String,
    pub bio: Option<String>,
    pub logo_filename: Option<String>,
    pub owner_id: i64,
    pub member_count: i64,
    pub created_at: String,
    pub updated_at: String,
}

impl ChannelRow {
    pub(crate) const COLUMNS: &'static str = "c.id, c.name, c.bio, c.logo_filename, c.owner_id,
         (SELECT COUNT(*) FROM channel_members m WHERE m.channel_id = c.id),
         c.created_at, c.updated_at";

    pub(crate) fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            name: row.get(1)?,
            bio: row.get(2)?,
            logo_filename: row.get(3)?,
            owner_id: row.get(4)?,
            member_count: row.get(5)?,
            created_at: row.get(6)?,
            updated_at: row.get(7)?,
        })
    }
}

#[derive(Debug, Clone)]
pub struct PostRow {
    pub id: i64,
    pub title: String,
    pub content: String,
    pub channel_id: i64,
    pub author_id: i64,
    pub is_flagged: bool,
    pub flag_reason: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl PostRow {
    pub(crate) const COLUMNS: &'static str = "p.id, p.title, p.content, p.channel_id, p.author_id,
         p.is_flagged, p.flag_reason, p.created_at, p.updated_at";

    pub(crate) fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            title: row.get(1)?,
            content: row.get(2)?,
            channel_id: row.get(3)?,
            author_id: row.get(4)?,
            is_flagged: row.get(5)?,
            flag_reason: row.get(6)?,
            created_at: row.get(7)?,
            updated_at: row.get(8)?,
        })
    }
}

#[derive(Debug, Clone)]
pub struct MediaFileRow {
    pub id: i64,
    pub filename: String,
    pub mime_type: String,
    pub size: i64,
    pub sha256: String,
    pub post_id: Option<i64>,
    pub uploader_id: Option<i64>,
    pub uploaded_at: String,
}

impl MediaFileRow {
    pub(crate) const COLUMNS: &'static str =
        "id, filename, mime_type, size, sha256, post_id, uploader_id, uploaded_at";

    pub(crate) fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            filename: row.get(1)?,
            mime_type: row.get(2)?,
            size: row.get(3)?,
            sha256: row.get(4)?,
            post_id: row.get(5)?,
            uploader_id: row.get(6)?,
            uploaded_at: row.get(7)?,
        })
    }
}

/// Metadata for a file already written to storage, ready to be recorded.
#[derive(Debug, Clone)]
pub struct NewMediaFile {
    pub filename: String,
    pub mime_type: String,
    pub size: i64,
    pub sha256: String,
}

#[derive(Debug, Clone)]
pub struct CommentRow {
    pub id: i64,
    pub content: String,
    pub post_id: i64,
    pub author_id: i64,
    pub parent_id: Option<i64>,
    pub created_at: String,
    pub updated_at: String,
}

impl CommentRow {
    pub(crate) const COLUMNS: &'static str =
        "c.id, c.content, c.post_id, c.author_id, c.parent_id, c.created_at, c.updated_at";

    pub(crate) fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            content: row.get(1)?,
            post_id: row.get(2)?,
            author_id: row.get(3)?,
            parent_id: row.get(4)?,
            created_at: row.get(5)?,
            updated_at: row.get(6)?,
        })
    }
}

#[derive(Debug, Clone)]
pub struct CommentWithAuthorRow {
    pub comment: CommentRow,
    pub author_email: String,
    pub author_username: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ReactionRow {
    pub id: i64,
    pub reaction_type: String,
    pub post_id: i64,
    pub user_id: i64,
    pub created_at: String,
    pub updated_at: String,
}

impl ReactionRow {
    pub(crate) const COLUMNS: &'static str =
        "id, reaction_type, post_id, user_id, created_at, updated_at";

    pub(crate) fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            reaction_type: row.get(1)?,
            post_id: row.get(2)?,
            user_id: row.get(3)?,
            created_at: row.get(4)?,
            updated_at: row.get(5)?,
        })
    }
}

#[derive(Debug, Clone)]
pub struct SavedPostRow {
    pub id: i64,
    pub user_id: i64,
    pub post_id: i64,
    pub saved_at: String,
}

#[derive(Debug, Clone)]
pub struct FlaggedWordRow {
    pub id: i64,
    pub word: String,
    pub created_at: String,
}

#[derive(Debug, Clone)]
pub struct RefreshTokenRow {
    pub id: String,
    pub user_id: i64,
    pub expires_at: String,
    pub revoked: bool,
    /// Computed against SQLite's clock at read time.
    pub expired: bool,
}

#[derive(Debug, Clone)]
pub struct PointTransactionRow {
    pub id: i64,
    pub user_id: i64,
    pub points: i64,
    pub action_type: String,
    pub description: String,
    pub related_entity_id: Option<i64>,
    pub related_entity_type: Option<String>,
    pub created_at: String,
}

#[derive(Debug, Clone)]
pub struct LeaderboardRow {
    pub user_id: i64,
    pub email: String,
    pub username: Option<String>,
    pub points: i64,
    pub rank: i64,
}

#[derive(Debug, Clone)]
pub struct AuditLogRow {
    pub id: i64,
    pub actor_id: Option<i64>,
    pub action: String,
    pub object_type: String,
    pub object_id: Option<i64>,
    pub data: Option<String>,
    pub created_at: String,
}
