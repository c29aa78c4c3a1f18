use anyhow::Result;
use rusqlite::{Connection, OptionalExtension};

use crate::Database;
use crate::models::UserRow;

impl Database {
    /// Inserts a user. Returns `None` when the email or username is already taken.
    pub fn create_user(
        &self,
        email: &str,
        username: Option<&str>,
        password_hash: &str,
        role: &str,
    ) -> Result<Option<UserRow>> {
        self.with_conn(|conn| {
            let inserted = conn.execute(
                "INSERT OR IGNORE INTO users (email, username, hashed_password, role)
                 VALUES (?1, ?2, ?3, ?4)",
                (email, username, password_hash, role),
            )?;
            if inserted == 0 {
                return Ok(None);
            }
            query_user_by_id(conn, conn.last_insert_rowid())
        })
    }

    pub fn get_user_by_email(&self, email: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| {
            let sql = format!("SELECT {} FROM users WHERE email = ?1", UserRow::COLUMNS);
            Ok(conn.query_row(&sql, [email], UserRow::from_row).optional()?)
        })
    }

    pub fn get_user_by_username(&self, username: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| {
            let sql = format!("SELECT {} FROM users WHERE username = ?1", UserRow::COLUMNS);
            Ok(conn.query_row(&sql, [username], UserRow::from_row).optional()?)
        })
    }

    pub fn get_user_by_id(&self, id: i64) -> Result<Option<UserRow>> {
        self.with_conn(|conn| query_user_by_id(conn, id))
    }

    /// Returns false when another user already holds the username.
    pub fn update_username(&self, id: i64, username: &str) -> Result<bool> {
        self.with_conn(|conn| {
            let updated = conn.execute(
                "UPDATE OR IGNORE users SET username = ?2, updated_at = datetime('now') WHERE id = ?1",
                (id, username),
            )?;
            Ok(updated > 0)
        })
    }

    pub fn update_role(&self, id: i64, role: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| {
            conn.execute(
                "UPDATE users SET role = ?2, updated_at = datetime('now') WHERE id = ?1",
                (id, role),
            )?;
            query_user_by_id(conn, id)
        })
    }

    pub fn set_user_active(&self, id: i64, active: bool) -> Result<bool> {
        self.with_conn(|conn| {
            let updated = conn.execute(
                "UPDATE users SET is_active = ?2, updated_at = datetime('now') WHERE id = ?1",
                (id, active),
            )?;
            Ok(updated > 0)
        })
    }
}

pub(crate) fn query_user_by_id(conn: &Connection, id: i64) -> Result<Option<UserRow>> {
    let sql = format!("SELECT {} FROM users WHERE id = ?1", UserRow::COLUMNS);
    Ok(conn.query_row(&sql, [id], UserRow::from_row).optional()?)
}

#[cfg(test)]
mod tests {
    use crate::Database;

    #[test]
    fn duplicate_email_is_ignored() {
        let db = Database::open_in_memory().unwrap();
        let user = db.create_user("a@example.com", None, "hash", "user").unwrap().unwrap();
        assert_eq!(user.points, 0);
        assert!(user.is_active);
        assert_eq!(user.role, "user");

        assert!(db.create_user("a@example.com", None, "other", "user").unwrap().is_none());
    }

    #[test]
    fn username_must_be_unique() {
        let db = Database::open_in_memory().unwrap();
        let a = db.create_user("a@example.com", Some("alice"), "h", "user").unwrap().unwrap();
        let b = db.create_user("b@example.com", None, "h", "user").unwrap().unwrap();

        assert!(!db.update_username(b.id, "alice").unwrap());
        assert!(db.update_username(b.id, "bob").unwrap());
        assert!(db.update_username(a.id, "alice").unwrap());

        let found = db.get_user_by_username("bob").unwrap().unwrap();
        assert_eq!(found.id, b.id);
    }

    #[test]
    fn role_update_returns_fresh_row() {
        let db = Database::open_in_memory().unwrap();
        let u = db.create_user("m@example.com", None, "h", "user").unwrap().unwrap();
        let updated = db.update_role(u.id, "moderator").unwrap().unwrap();
        assert_eq!(updated.role, "moderator");
        assert!(db.update_role(9999, "admin").unwrap().is_none());
    }
}
