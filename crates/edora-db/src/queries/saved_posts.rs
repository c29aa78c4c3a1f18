use anyhow::Result;
use rusqlite::OptionalExtension;

use crate::Database;
use crate::models::{PostRow, SavedPostRow};

impl Database {
    /// Bookmarks a post. Returns `None` when it was already saved.
    pub fn save_post(&self, user_id: i64, post_id: i64) -> Result<Option<SavedPostRow>> {
        self.with_conn(|conn| {
            let inserted = conn.execute(
                "INSERT OR IGNORE INTO saved_posts (user_id, post_id) VALUES (?1, ?2)",
                (user_id, post_id),
            )?;
            if inserted == 0 {
                return Ok(None);
            }
            let row = conn.query_row(
                "SELECT id, user_id, post_id, saved_at FROM saved_posts WHERE id = ?1",
                [conn.last_insert_rowid()],
                |row| {
                    Ok(SavedPostRow {
                        id: row.get(0)?,
                        user_id: row.get(1)?,
                        post_id: row.get(2)?,
                        saved_at: row.get(3)?,
                    })
                },
            )?;
            Ok(Some(row))
        })
    }

    /// Returns false when the post was not saved.
    pub fn unsave_post(&self, user_id: i64, post_id: i64) -> Result<bool> {
        self.with_conn(|conn| {
            let removed = conn.execute(
                "DELETE FROM saved_posts WHERE user_id = ?1 AND post_id = ?2",
                (user_id, post_id),
            )?;
            Ok(removed > 0)
        })
    }

    /// Posts the user saved, most recently saved first.
    pub fn list_saved_posts(&self, user_id: i64) -> Result<Vec<PostRow>> {
        self.with_conn(|conn| {
            let sql = format!(
                "SELECT {} FROM saved_posts s
                 JOIN posts p ON s.post_id = p.id
                 WHERE s.user_id = ?1
                 ORDER BY s.saved_at DESC, s.id DESC",
                PostRow::COLUMNS
            );
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map([user_id], PostRow::from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    pub fn is_post_saved(&self, user_id: i64, post_id: i64) -> Result<bool> {
        self.with_conn(|conn| {
            let found: Option<i64> = conn
                .query_row(
                    "SELECT id FROM saved_posts WHERE user_id = ?1 AND post_id = ?2",
                    (user_id, post_id),
                    |row| row.get(0),
                )
                .optional()?;
            Ok(found.is_some())
        })
    }
}

#[cfg(test)]
mod tests {
    use crate::Database;

    #[test]
    fn save_is_unique_and_listed_newest_first() {
        let db = Database::open_in_memory().unwrap();
        let u = db.create_user("u@example.com", None, "h", "user").unwrap().unwrap();
        let channel = db.create_channel("c", None, u.id).unwrap().unwrap();
        let p1 = db.create_post("one", "x", channel.id, u.id, None).unwrap().unwrap();
        let p2 = db.create_post("two", "x", channel.id, u.id, None).unwrap().unwrap();

        assert!(db.save_post(u.id, p1.id).unwrap().is_some());
        assert!(db.save_post(u.id, p1.id).unwrap().is_none());
        db.save_post(u.id, p2.id).unwrap().unwrap();

        let saved = db.list_saved_posts(u.id).unwrap();
        assert_eq!(saved.iter().map(|p| p.id).collect::<Vec<_>>(), vec![p2.id, p1.id]);

        assert!(db.unsave_post(u.id, p1.id).unwrap());
        assert!(!db.unsave_post(u.id, p1.id).unwrap());
        assert!(!db.is_post_saved(u.id, p1.id).unwrap());
        assert!(db.is_post_saved(u.id, p2.id).unwrap());
    }
}
