use anyhow::Result;
use rusqlite::OptionalExtension;

use crate::Database;
use crate::models::RefreshTokenRow;

impl Database {
    pub fn insert_refresh_token(&self, id: &str, user_id: i64, ttl_days: i64) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO refresh_tokens (id, user_id, expires_at)
                 VALUES (?1, ?2, datetime('now', printf('%+d days', ?3)))",
                (id, user_id, ttl_days),
            )?;
            Ok(())
        })
    }

    pub fn get_refresh_token(&self, id: &str) -> Result<Option<RefreshTokenRow>> {
        self.with_conn(|conn| {
            let row = conn
                .query_row(
                    "SELECT id, user_id, expires_at, revoked, expires_at <= datetime('now')
                     FROM refresh_tokens WHERE id = ?1",
                    [id],
                    |row| {
                        Ok(RefreshTokenRow {
                            id: row.get(0)?,
                            user_id: row.get(1)?,
                            expires_at: row.get(2)?,
                            revoked: row.get(3)?,
                            expired: row.get(4)?,
                        })
                    },
                )
                .optional()?;
            Ok(row)
        })
    }

    /// Returns false when no live token had this id.
    pub fn revoke_refresh_token(&self, id: &str) -> Result<bool> {
        self.with_conn(|conn| {
            let updated = conn.execute(
                "UPDATE refresh_tokens SET revoked = 1 WHERE id = ?1 AND revoked = 0",
                [id],
            )?;
            Ok(updated > 0)
        })
    }

    /// Revokes every outstanding refresh token of a user.
    pub fn revoke_user_refresh_tokens(&self, user_id: i64) -> Result<usize> {
        self.with_conn(|conn| {
            let updated = conn.execute(
                "UPDATE refresh_tokens SET revoked = 1 WHERE user_id = ?1 AND revoked = 0",
                [user_id],
            )?;
            Ok(updated)
        })
    }
}

#[cfg(test)]
mod tests {
    use crate::Database;

    #[test]
    fn expiry_and_revocation() {
        let db = Database::open_in_memory().unwrap();
        let u = db.create_user("u@example.com", None, "h", "user").unwrap().unwrap();

        db.insert_refresh_token("live", u.id, 7).unwrap();
        db.insert_refresh_token("stale", u.id, -1).unwrap();

        let live = db.get_refresh_token("live").unwrap().unwrap();
        assert!(!live.expired);
        assert!(!live.revoked);
        assert!(db.get_refresh_token("stale").unwrap().unwrap().expired);
        assert!(db.get_refresh_token("missing").unwrap().is_none());

        assert!(db.revoke_refresh_token("live").unwrap());
        assert!(!db.revoke_refresh_token("live").unwrap());
        assert!(db.get_refresh_token("live").unwrap().unwrap().revoked);

        assert_eq!(db.revoke_user_refresh_tokens(u.id).unwrap(), 1);
    }
}
