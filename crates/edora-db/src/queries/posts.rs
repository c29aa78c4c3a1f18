use anyhow::Result;
use rusqlite::{Connection, OptionalExtension};

use crate::Database;
use crate::models::PostRow;

impl Database {
    /// Inserts a post; a `Some` flag reason stores it as flagged.
    /// Returns `None` when the channel already has a post with this title.
    pub fn create_post(
        &self,
        title: &str,
        content: &str,
        channel_id: i64,
        author_id: i64,
        flag_reason: Option<&str>,
    ) -> Result<Option<PostRow>> {
        self.with_conn(|conn| {
            let inserted = conn.execute(
                "INSERT OR IGNORE INTO posts (title, content, channel_id, author_id, is_flagged, flag_reason)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                rusqlite::params![
                    title,
                    content,
                    channel_id,
                    author_id,
                    flag_reason.is_some(),
                    flag_reason
                ],
            )?;
            if inserted == 0 {
                return Ok(None);
            }
            query_post(conn, conn.last_insert_rowid())
        })
    }

    pub fn get_post(&self, id: i64) -> Result<Option<PostRow>> {
        self.with_conn(|conn| query_post(conn, id))
    }

    pub fn post_title_taken(&self, channel_id: i64, title: &str, exclude_id: Option<i64>) -> Result<bool> {
        self.with_conn(|conn| {
            let found: Option<i64> = conn
                .query_row(
                    "SELECT id FROM posts WHERE channel_id = ?1 AND title = ?2 AND (?3 IS NULL OR id != ?3)",
                    (channel_id, title, exclude_id),
                    |row| row.get(0),
                )
                .optional()?;
            Ok(found.is_some())
        })
    }

    /// Lists posts newest first. Flagged posts are only included for their
    /// author, or for everyone when `include_flagged` is set.
    pub fn list_posts(
        &self,
        channel_id: Option<i64>,
        viewer_id: i64,
        include_flagged: bool,
    ) -> Result<Vec<PostRow>> {
        self.with_conn(|conn| {
            let sql = format!(
                "SELECT {} FROM posts p
                 WHERE (?1 IS NULL OR p.channel_id = ?1)
                   AND (?2 OR p.is_flagged = 0 OR p.author_id = ?3)
                 ORDER BY p.created_at DESC, p.id DESC",
                PostRow::COLUMNS
            );
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map((channel_id, include_flagged, viewer_id), PostRow::from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    pub fn list_flagged_posts(&self) -> Result<Vec<PostRow>> {
        self.with_conn(|conn| {
            let sql = format!(
                "SELECT {} FROM posts p WHERE p.is_flagged = 1 ORDER BY p.created_at ASC, p.id ASC",
                PostRow::COLUMNS
            );
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map([], PostRow::from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    /// Applies the provided fields. A `Some` flag reason marks the post as
    /// flagged; `None` leaves the flag state alone. Returns false when the
    /// new title collides with another post in the same channel.
    pub fn update_post(
        &self,
        id: i64,
        title: Option<&str>,
        content: Option<&str>,
        flag_reason: Option<&str>,
    ) -> Result<bool> {
        self.with_conn(|conn| {
            let updated = conn.execute(
                "UPDATE OR IGNORE posts
                 SET title = COALESCE(?2, title),
                     content = COALESCE(?3, content),
                     is_flagged = CASE WHEN ?4 IS NULL THEN is_flagged ELSE 1 END,
                     flag_reason = COALESCE(?4, flag_reason),
                     updated_at = datetime('now')
                 WHERE id = ?1",
                (id, title, content, flag_reason),
            )?;
            Ok(updated > 0)
        })
    }

    /// Clears the moderation flag. Returns false for unknown posts.
    pub fn approve_post(&self, id: i64) -> Result<bool> {
        self.with_conn(|conn| {
            let updated = conn.execute(
                "UPDATE posts SET is_flagged = 0, flag_reason = NULL, updated_at = datetime('now')
                 WHERE id = ?1",
                [id],
            )?;
            Ok(updated > 0)
        })
    }

    /// Deletes a post together with its comments, media rows, reactions and
    /// saves. Returns the storage paths of the removed media files.
    pub fn delete_post(&self, id: i64) -> Result<Vec<String>> {
        self.with_conn(|conn| {
            let tx = conn.unchecked_transaction()?;
            let files = delete_post_rows(&tx, id)?;
            tx.commit()?;
            Ok(files)
        })
    }
}

fn query_post(conn: &Connection, id: i64) -> Result<Option<PostRow>> {
    let sql = format!("SELECT {} FROM posts p WHERE p.id = ?1", PostRow::COLUMNS);
    Ok(conn.query_row(&sql, [id], PostRow::from_row).optional()?)
}

/// Removes a post and everything hanging off it. Runs inside the caller's
/// transaction.
pub(crate) fn delete_post_rows(conn: &Connection, post_id: i64) -> Result<Vec<String>> {
    let mut stmt = conn.prepare("SELECT filename FROM media_files WHERE post_id = ?1")?;
    let files = stmt
        .query_map([post_id], |row| row.get::<_, String>(0))?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    conn.execute("DELETE FROM comments WHERE post_id = ?1", [post_id])?;
    conn.execute("DELETE FROM media_files WHERE post_id = ?1", [post_id])?;
    conn.execute("DELETE FROM post_reactions WHERE post_id = ?1", [post_id])?;
    conn.execute("DELETE FROM saved_posts WHERE post_id = ?1", [post_id])?;
    conn.execute("DELETE FROM posts WHERE id = ?1", [post_id])?;

    Ok(files)
}
