use anyhow::Result;
use rusqlite::{Connection, OptionalExtension};

use crate::Database;
use crate::models::{ChannelRow, UserRow};
use crate::queries::posts::delete_post_rows;

impl Database {
    /// Creates a channel and enrols its owner as the first member.
    /// Returns `None` when the name is taken.
    pub fn create_channel(
        &self,
        name: &str,
        bio: Option<&str>,
        owner_id: i64,
    ) -> Result<Option<ChannelRow>> {
        self.with_conn(|conn| {
            let tx = conn.unchecked_transaction()?;
            let inserted = tx.execute(
                "INSERT OR IGNORE INTO channels (name, bio, owner_id) VALUES (?1, ?2, ?3)",
                (name, bio, owner_id),
            )?;
            if inserted == 0 {
                return Ok(None);
            }
            let channel_id = tx.last_insert_rowid();
            tx.execute(
                "INSERT INTO channel_members (channel_id, user_id) VALUES (?1, ?2)",
                (channel_id, owner_id),
            )?;
            tx.commit()?;

            query_channel(conn, channel_id)
        })
    }

    pub fn get_channel(&self, id: i64) -> Result<Option<ChannelRow>> {
        self.with_conn(|conn| query_channel(conn, id))
    }

    pub fn get_channel_by_name(&self, name: &str) -> Result<Option<ChannelRow>> {
        self.with_conn(|conn| {
            let sql = format!("SELECT {} FROM channels c WHERE c.name = ?1", ChannelRow::COLUMNS);
            Ok(conn.query_row(&sql, [name], ChannelRow::from_row).optional()?)
        })
    }

    pub fn list_channels(&self) -> Result<Vec<ChannelRow>> {
        self.with_conn(|conn| {
            let sql = format!(
                "SELECT {} FROM channels c ORDER BY c.created_at ASC, c.id ASC",
                ChannelRow::COLUMNS
            );
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map([], ChannelRow::from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    /// Applies the provided fields. Returns false when the new name collides
    /// with another channel.
    pub fn update_channel(&self, id: i64, name: Option<&str>, bio: Option<&str>) -> Result<bool> {
        self.with_conn(|conn| {
            let updated = conn.execute(
                "UPDATE OR IGNORE channels
                 SET name = COALESCE(?2, name),
                     bio = COALESCE(?3, bio),
                     updated_at = datetime('now')
                 WHERE id = ?1",
                (id, name, bio),
            )?;
            Ok(updated > 0)
        })
    }

    /// Deletes a channel with all of its posts (and their dependents) and
    /// memberships. Returns the storage paths of media files that belonged
    /// to the removed posts.
    pub fn delete_channel(&self, id: i64) -> Result<Vec<String>> {
        self.with_conn(|conn| {
            let tx = conn.unchecked_transaction()?;

            let post_ids: Vec<i64> = {
                let mut stmt = tx.prepare("SELECT id FROM posts WHERE channel_id = ?1")?;
                let ids = stmt
                    .query_map([id], |row| row.get(0))?
                    .collect::<std::result::Result<Vec<_>, _>>()?;
                ids
            };

            let mut files = Vec::new();
            for post_id in post_ids {
                files.extend(delete_post_rows(&tx, post_id)?);
            }

            tx.execute("DELETE FROM channel_members WHERE channel_id = ?1", [id])?;
            tx.execute("DELETE FROM channels WHERE id = ?1", [id])?;
            tx.commit()?;

            Ok(files)
        })
    }

    /// Returns false when the user was already a member.
    pub fn join_channel(&self, channel_id: i64, user_id: i64) -> Result<bool> {
        self.with_conn(|conn| {
            let inserted = conn.execute(
                "INSERT OR IGNORE INTO channel_members (channel_id, user_id) VALUES (?1, ?2)",
                (channel_id, user_id),
            )?;
            Ok(inserted > 0)
        })
    }

    /// Returns false when the user was not a member.
    pub fn leave_channel(&self, channel_id: i64, user_id: i64) -> Result<bool> {
        self.with_conn(|conn| {
            let removed = conn.execute(
                "DELETE FROM channel_members WHERE channel_id = ?1 AND user_id = ?2",
                (channel_id, user_id),
            )?;
            Ok(removed > 0)
        })
    }

    pub fn is_channel_member(&self, channel_id: i64, user_id: i64) -> Result<bool> {
        self.with_conn(|conn| {
            let found: Option<i64> = conn
                .query_row(
                    "SELECT 1 FROM channel_members WHERE channel_id = ?1 AND user_id = ?2",
                    (channel_id, user_id),
                    |row| row.get(0),
                )
                .optional()?;
            Ok(found.is_some())
        })
    }

    pub fn list_channel_members(&self, channel_id: i64) -> Result<Vec<UserRow>> {
        self.with_conn(|conn| {
            let sql = format!(
                "SELECT {} FROM users
                 WHERE id IN (SELECT user_id FROM channel_members WHERE channel_id = ?1)
                 ORDER BY id ASC",
                UserRow::COLUMNS
            );
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map([channel_id], UserRow::from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }
}

fn query_channel(conn: &Connection, id: i64) -> Result<Option<ChannelRow>> {
    let sql = format!("SELECT {} FROM channels c WHERE c.id = ?1", ChannelRow::COLUMNS);
    Ok(conn.query_row(&sql, [id], ChannelRow::from_row).optional()?)
}

#[cfg(test)]
mod tests {
    use crate::Database;
    use crate::models::NewMediaFile;

    #[test]
    fn owner_is_first_member() {
        let db = Database::open_in_memory().unwrap();
        let owner = db.create_user("o@example.com", None, "h", "user").unwrap().unwrap();
        let channel = db.create_channel("rust", Some("all things rust"), owner.id).unwrap().unwrap();

        assert_eq!(channel.member_count, 1);
        assert!(db.is_channel_member(channel.id, owner.id).unwrap());
        assert!(db.create_channel("rust", None, owner.id).unwrap().is_none());
    }

    #[test]
    fn join_and_leave_report_state_changes() {
        let db = Database::open_in_memory().unwrap();
        let owner = db.create_user("o@example.com", None, "h", "user").unwrap().unwrap();
        let other = db.create_user("x@example.com", None, "h", "user").unwrap().unwrap();
        let channel = db.create_channel("general", None, owner.id).unwrap().unwrap();

        assert!(db.join_channel(channel.id, other.id).unwrap());
        assert!(!db.join_channel(channel.id, other.id).unwrap());
        assert_eq!(db.list_channel_members(channel.id).unwrap().len(), 2);

        assert!(db.leave_channel(channel.id, other.id).unwrap());
        assert!(!db.leave_channel(channel.id, other.id).unwrap());
    }

    #[test]
    fn rename_to_taken_name_is_rejected() {
        let db = Database::open_in_memory().unwrap();
        let owner = db.create_user("o@example.com", None, "h", "user").unwrap().unwrap();
        db.create_channel("a", None, owner.id).unwrap().unwrap();
        let b = db.create_channel("b", None, owner.id).unwrap().unwrap();

        assert!(!db.update_channel(b.id, Some("a"), None).unwrap());
        assert!(db.update_channel(b.id, None, Some("new bio")).unwrap());
        let b = db.get_channel(b.id).unwrap().unwrap();
        assert_eq!(b.name, "b");
        assert_eq!(b.bio.as_deref(), Some("new bio"));
    }

    #[test]
    fn delete_cascades_through_posts() {
        let db = Database::open_in_memory().unwrap();
        let owner = db.create_user("o@example.com", None, "h", "user").unwrap().unwrap();
        let channel = db.create_channel("doomed", None, owner.id).unwrap().unwrap();
        let post = db
            .create_post("hello", "world", channel.id, owner.id, None)
            .unwrap()
            .unwrap();
        db.create_comment("first", post.id, owner.id, None).unwrap();
        db.insert_media_files(
            &[NewMediaFile {
                filename: "abc/pic.png".into(),
                mime_type: "image/png".into(),
                size: 3,
                sha256: "00".into(),
            }],
            Some(post.id),
            owner.id,
        )
        .unwrap();

        let files = db.delete_channel(channel.id).unwrap();
        assert_eq!(files, vec!["abc/pic.png".to_string()]);
        assert!(db.get_channel(channel.id).unwrap().is_none());
        assert!(db.get_post(post.id).unwrap().is_none());
    }
}
