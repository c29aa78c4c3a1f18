use anyhow::{Result, anyhow};
use rusqlite::{Connection, OptionalExtension};

use crate::Database;
use crate::models::ReactionRow;

impl Database {
    pub fn get_user_reaction(&self, post_id: i64, user_id: i64) -> Result<Option<ReactionRow>> {
        self.with_conn(|conn| query_user_reaction(conn, post_id, user_id))
    }

    /// Creates the user's reaction on a post, or switches its type in place.
    /// Returns the stored row and the reaction type it replaced, if any.
    pub fn upsert_reaction(
        &self,
        post_id: i64,
        user_id: i64,
        reaction_type: &str,
    ) -> Result<(ReactionRow, Option<String>)> {
        self.with_conn(|conn| {
            let tx = conn.unchecked_transaction()?;
            let previous = query_user_reaction(&tx, post_id, user_id)?.map(|r| r.reaction_type);

            tx.execute(
                "INSERT INTO post_reactions (reaction_type, post_id, user_id) VALUES (?1, ?2, ?3)
                 ON CONFLICT(post_id, user_id) DO UPDATE
                 SET reaction_type = excluded.reaction_type, updated_at = datetime('now')",
                (reaction_type, post_id, user_id),
            )?;

            let row = query_user_reaction(&tx, post_id, user_id)?
                .ok_or_else(|| anyhow!("Reaction for post {} user {} vanished", post_id, user_id))?;
            tx.commit()?;

            Ok((row, previous))
        })
    }

    /// Removes the user's reaction and returns it, or `None` if there was none.
    pub fn delete_reaction(&self, post_id: i64, user_id: i64) -> Result<Option<ReactionRow>> {
        self.with_conn(|conn| {
            let tx = conn.unchecked_transaction()?;
            let existing = query_user_reaction(&tx, post_id, user_id)?;
            if let Some(reaction) = &existing {
                tx.execute("DELETE FROM post_reactions WHERE id = ?1", [reaction.id])?;
            }
            tx.commit()?;
            Ok(existing)
        })
    }

    /// Returns `(likes, dislikes)` for a post.
    pub fn reaction_counts(&self, post_id: i64) -> Result<(i64, i64)> {
        self.with_conn(|conn| {
            let counts = conn.query_row(
                "SELECT
                     COALESCE(SUM(reaction_type = 'like'), 0),
                     COALESCE(SUM(reaction_type = 'dislike'), 0)
                 FROM post_reactions WHERE post_id = ?1",
                [post_id],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )?;
            Ok(counts)
        })
    }
}

fn query_user_reaction(conn: &Connection, post_id: i64, user_id: i64) -> Result<Option<ReactionRow>> {
    let sql = format!(
        "SELECT {} FROM post_reactions WHERE post_id = ?1 AND user_id = ?2",
        ReactionRow::COLUMNS
    );
    Ok(conn.query_row(&sql, (post_id, user_id), ReactionRow::from_row).optional()?)
}

#[cfg(test)]
mod tests {
    use crate::Database;

    #[test]
    fn one_reaction_per_user_per_post() {
        let db = Database::open_in_memory().unwrap();
        let a = db.create_user("a@example.com", None, "h", "user").unwrap().unwrap();
        let b = db.create_user("b@example.com", None, "h", "user").unwrap().unwrap();
        let channel = db.create_channel("c", None, a.id).unwrap().unwrap();
        let post = db.create_post("t", "x", channel.id, a.id, None).unwrap().unwrap();

        let (first, previous) = db.upsert_reaction(post.id, b.id, "like").unwrap();
        assert_eq!(previous, None);
        assert_eq!(first.reaction_type, "like");

        let (second, previous) = db.upsert_reaction(post.id, b.id, "dislike").unwrap();
        assert_eq!(previous.as_deref(), Some("like"));
        assert_eq!(second.id, first.id);
        assert_eq!(db.reaction_counts(post.id).unwrap(), (0, 1));

        db.upsert_reaction(post.id, a.id, "like").unwrap();
        assert_eq!(db.reaction_counts(post.id).unwrap(), (1, 1));

        let removed = db.delete_reaction(post.id, b.id).unwrap().unwrap();
        assert_eq!(removed.reaction_type, "dislike");
        assert!(db.delete_reaction(post.id, b.id).unwrap().is_none());
        assert_eq!(db.reaction_counts(post.id).unwrap(), (1, 0));
    }

    #[test]
    fn unknown_reaction_type_is_rejected() {
        let db = Database::open_in_memory().unwrap();
        let a = db.create_user("a@example.com", None, "h", "user").unwrap().unwrap();
        let channel = db.create_channel("c", None, a.id).unwrap().unwrap();
        let post = db.create_post("t", "x", channel.id, a.id, None).unwrap().unwrap();

        assert!(db.upsert_reaction(post.id, a.id, "love").is_err());
    }
}
